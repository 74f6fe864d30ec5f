use std::fs;
use std::time::Duration;

use chrono::{Local, TimeZone};
use timetasker::{
    Clock, CompletionLog, Config, CountdownTimer, Direction, ManualClock, Overrides, ProjectDirs, Settings, Tick,
    TimerState,
};

fn noon_clock() -> ManualClock {
    let noon = Local
        .with_ymd_and_hms(2026, 10, 19, 12, 0, 0)
        .single()
        .expect("unambiguous local time");
    ManualClock::starting_at(noon)
}

fn dirs_under(root: &std::path::Path) -> ProjectDirs {
    ProjectDirs {
        config_dir: root.join("config"),
        data_dir: root.join("data"),
        cache_dir: root.join("cache"),
    }
}

#[test]
fn one_second_interval_completes_and_persists() {
    let tmp = tempfile::tempdir().unwrap();
    let dirs = dirs_under(tmp.path());
    fs::create_dir_all(&dirs.config_dir).unwrap();
    fs::write(dirs.config_file(), "[timer]\nwork_interval = \"1s\"\n").unwrap();

    let config = Config::load(&dirs.config_file()).unwrap();
    let settings = Settings::resolve(&config, &Overrides::default(), &dirs).unwrap();
    assert_eq!(settings.work_interval, Duration::from_secs(1));

    let log = CompletionLog::load_or_recover(&settings.completions_file).unwrap();
    let clock = noon_clock();
    let mut timer = CountdownTimer::with_clock(settings.work_interval, log, clock.clone());

    timer.start();
    clock.advance(Duration::from_secs(1));
    assert!(matches!(timer.tick(), Tick::Completed(Ok(()))));

    assert_eq!(timer.log().count_today(clock.wall()), 1);
    assert_eq!(timer.state(), TimerState::Running(Direction::Up));

    let reloaded = CompletionLog::load(&settings.completions_file).unwrap();
    assert_eq!(reloaded.count_today(clock.wall()), 1);
}

#[test]
fn history_survives_a_restart() {
    let tmp = tempfile::tempdir().unwrap();
    let dirs = dirs_under(tmp.path());
    let clock = noon_clock();

    for _ in 0..2 {
        let log = CompletionLog::load_or_recover(&dirs.completions_file()).unwrap();
        let mut timer = CountdownTimer::with_clock(Duration::from_secs(60), log, clock.clone());
        timer.start();
        clock.advance(Duration::from_secs(60));
        assert!(timer.tick().is_completed());
    }

    let log = CompletionLog::load(&dirs.completions_file()).unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log.count_today(clock.wall()), 2);
}

#[test]
fn corrupt_history_does_not_block_startup() {
    let tmp = tempfile::tempdir().unwrap();
    let dirs = dirs_under(tmp.path());
    fs::create_dir_all(&dirs.cache_dir).unwrap();
    fs::write(dirs.completions_file(), b"\x00\x01garbage").unwrap();

    let log = CompletionLog::load_or_recover(&dirs.completions_file()).unwrap();
    assert!(log.is_empty());

    let clock = noon_clock();
    let mut timer = CountdownTimer::with_clock(Duration::from_secs(5), log, clock.clone());
    timer.start();
    clock.advance(Duration::from_secs(5));
    assert!(matches!(timer.tick(), Tick::Completed(Ok(()))));
    assert_eq!(CompletionLog::load(&dirs.completions_file()).unwrap().len(), 1);
}
