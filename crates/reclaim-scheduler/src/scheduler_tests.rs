use super::*;
use chrono::TimeDelta;
use futures::FutureExt;
use tokio::sync::{Notify, mpsc};

fn every_second() -> Trigger {
    Trigger::cron("* * * * * *").unwrap()
}

/// An action that reports each start on a channel.
fn reporting_action(tx: mpsc::UnboundedSender<()>) -> JobAction {
    Arc::new(move || {
        let tx = tx.clone();
        async move {
            let _ = tx.send(());
        }
        .boxed()
    })
}

fn noop() -> JobAction {
    Arc::new(|| async {}.boxed())
}

async fn recv_once(rx: &mut mpsc::UnboundedReceiver<()>) {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("job did not fire")
        .expect("channel closed");
}

#[tokio::test]
async fn test_add_and_list_jobs() {
    let scheduler = BackgroundScheduler::new();
    scheduler.add_job("1", Trigger::cron("0 0 3 * * *").unwrap(), noop());
    scheduler.add_job("0", every_second(), noop());

    let jobs = scheduler.jobs();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].id, "0");
    assert_eq!(jobs[1].trigger, "cron[0 0 3 * * *]");
    assert!(jobs.iter().all(|j| !j.is_paused()));
}

#[tokio::test]
async fn test_add_replaces_existing_id() {
    let scheduler = BackgroundScheduler::new();
    scheduler.add_job("0", every_second(), noop());
    scheduler.add_job("0", Trigger::cron("0 0 3 * * *").unwrap(), noop());

    let jobs = scheduler.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].trigger, "cron[0 0 3 * * *]");
}

#[tokio::test]
async fn test_pause_resume_remove() {
    let scheduler = BackgroundScheduler::new();
    scheduler.add_job("0", every_second(), noop());

    scheduler.pause_job("0").unwrap();
    assert!(scheduler.get_job("0").unwrap().is_paused());

    scheduler.resume_job("0").unwrap();
    assert!(!scheduler.get_job("0").unwrap().is_paused());

    scheduler.remove_job("0").unwrap();
    assert!(scheduler.get_job("0").is_none());
}

#[tokio::test]
async fn test_unknown_job_fails() {
    let scheduler = BackgroundScheduler::new();
    assert!(matches!(
        scheduler.pause_job("9"),
        Err(SchedulerError::JobNotFound(id)) if id == "9"
    ));
    assert!(matches!(
        scheduler.resume_job("9"),
        Err(SchedulerError::JobNotFound(_))
    ));
    assert!(matches!(
        scheduler.remove_job("9"),
        Err(SchedulerError::JobNotFound(_))
    ));
}

#[tokio::test]
async fn test_tick_fires_due_job() {
    let scheduler = BackgroundScheduler::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    scheduler.add_job("0", every_second(), reporting_action(tx));

    let now = Local::now();
    assert_eq!(scheduler.tick_at(now - TimeDelta::seconds(10)), 0);
    assert_eq!(scheduler.tick_at(now + TimeDelta::seconds(5)), 1);
    recv_once(&mut rx).await;
}

#[tokio::test]
async fn test_missed_fires_coalesce() {
    let scheduler = BackgroundScheduler::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    scheduler.add_job("0", every_second(), reporting_action(tx));

    // A day of missed per-second fires runs once.
    let later = Local::now() + TimeDelta::days(1);
    assert_eq!(scheduler.tick_at(later), 1);
    recv_once(&mut rx).await;

    let next = scheduler.get_job("0").unwrap().next_fire.unwrap();
    assert!(next > later);
    assert_eq!(scheduler.tick_at(later), 0);
}

#[tokio::test]
async fn test_paused_job_does_not_fire() {
    let scheduler = BackgroundScheduler::new();
    scheduler.add_job("0", every_second(), noop());
    scheduler.pause_job("0").unwrap();

    assert_eq!(scheduler.tick_at(Local::now() + TimeDelta::days(1)), 0);
}

#[tokio::test]
async fn test_in_flight_job_is_not_restarted() {
    let scheduler = BackgroundScheduler::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<()>();
    let release = Arc::new(Notify::new());

    let gate = release.clone();
    let action: JobAction = Arc::new(move || {
        let tx = tx.clone();
        let gate = gate.clone();
        async move {
            let _ = tx.send(());
            gate.notified().await;
        }
        .boxed()
    });
    scheduler.add_job("0", every_second(), action);

    let now = Local::now();
    assert_eq!(scheduler.tick_at(now + TimeDelta::seconds(5)), 1);
    recv_once(&mut rx).await;

    assert_eq!(scheduler.tick_at(now + TimeDelta::seconds(60)), 0);

    release.notify_one();
    // Wait for the guard to clear the flag.
    for i in 0..100 {
        if scheduler.tick_at(now + TimeDelta::seconds(120 + i)) == 1 {
            recv_once(&mut rx).await;
            release.notify_one();
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job never became runnable again");
}

#[tokio::test]
async fn test_date_job_fires_once_and_is_removed() {
    let scheduler = BackgroundScheduler::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let run_at = Local::now() + TimeDelta::minutes(5);
    scheduler.add_job("once", Trigger::Date { run_at }, reporting_action(tx));

    assert_eq!(scheduler.tick_at(run_at - TimeDelta::seconds(1)), 0);
    assert_eq!(scheduler.tick_at(run_at), 1);
    recv_once(&mut rx).await;
    assert!(scheduler.get_job("once").is_none());
}

#[tokio::test]
async fn test_date_job_due_while_in_flight_is_still_removed() {
    let scheduler = BackgroundScheduler::new();
    let run_at = Local::now() + TimeDelta::minutes(5);
    scheduler.add_job("once", Trigger::Date { run_at }, noop());
    scheduler
        .jobs
        .read()
        .get("once")
        .unwrap()
        .in_flight
        .store(true, Ordering::SeqCst);

    assert_eq!(scheduler.tick_at(run_at), 0);
    assert!(scheduler.get_job("once").is_none());
}

#[tokio::test]
async fn test_resumed_past_date_job_fires_and_is_removed() {
    let scheduler = BackgroundScheduler::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let run_at = Local::now() - TimeDelta::minutes(5);
    scheduler.add_job("once", Trigger::Date { run_at }, reporting_action(tx));

    scheduler.pause_job("once").unwrap();
    scheduler.resume_job("once").unwrap();
    assert!(!scheduler.get_job("once").unwrap().is_paused());

    assert_eq!(scheduler.tick_at(Local::now()), 1);
    recv_once(&mut rx).await;
    assert!(scheduler.get_job("once").is_none());
}

#[tokio::test]
async fn test_background_loop_runs_and_shuts_down() {
    let scheduler =
        Arc::new(BackgroundScheduler::new().with_tick_interval(Duration::from_millis(20)));
    let (tx, mut rx) = mpsc::unbounded_channel();
    scheduler.add_job(
        "fast",
        Trigger::interval("1").unwrap(),
        reporting_action(tx),
    );

    let handle = scheduler.start();
    recv_once(&mut rx).await;

    scheduler.shutdown();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop did not stop")
        .unwrap();
}
