mod mocks;

use std::time::Duration;

use digest_pulse::{
    criteria::RunCriteria, outcome::RunStatus, RunCoordinatorBuilder, SchedulePhase, Scheduler,
};
use mocks::{
    channel, channel_source::MockChannelSource, media_source::MockMediaSource,
    notifier::MockNotifier, summarizer::MockSummarizer, text_source::MockTextSource, video,
};

const HOUR: Duration = Duration::from_secs(3600);

fn criteria() -> RunCriteria {
    RunCriteria {
        queries: vec!["crypto news".into()],
        relevance_threshold: 0.5,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_overrunning_runs_are_never_concurrent() {
    let c = channel("c", 0.9);
    // every run takes twice the interval
    let channels = MockChannelSource::new(vec![c.clone()]).with_delay(2 * HOUR);
    let gauge = channels.gauge.clone();
    let discover_calls = channels.calls.clone();
    let notifier = MockNotifier::default();
    let delivered = notifier.delivered.clone();

    let coordinator = RunCoordinatorBuilder::new()
        .channel_source(channels)
        .media_source(MockMediaSource::default().with_videos(&c, vec![video(&c, "v1")]))
        .text_source(MockTextSource::new("transcript"))
        .summarizer(MockSummarizer::new("summary"))
        .notifier(notifier)
        .build();

    let criteria = RunCriteria {
        deadlines: digest_pulse::criteria::Deadlines {
            api: 4 * HOUR,
            ..Default::default()
        },
        ..criteria()
    };
    let handle = Scheduler::start(coordinator, criteria, HOUR).unwrap();

    let state = handle.wait_for(|s| s.runs_completed == 3).await;
    assert_eq!(state.last_status, Some(RunStatus::Success));

    handle.cancel();
    let state = handle.join().await.unwrap();

    assert_eq!(state.phase, SchedulePhase::Cancelled);
    assert_eq!(gauge.max(), 1, "Runs must not overlap");
    assert_eq!(discover_calls.lock().unwrap().len(), 3);
    assert_eq!(delivered.lock().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_while_waiting_stops_further_runs() {
    let c = channel("c", 0.9);
    let channels = MockChannelSource::new(vec![c.clone()]);
    let discover_calls = channels.calls.clone();

    let coordinator = RunCoordinatorBuilder::new()
        .channel_source(channels)
        .media_source(MockMediaSource::default().with_videos(&c, vec![video(&c, "v1")]))
        .text_source(MockTextSource::absent())
        .summarizer(MockSummarizer::new("summary"))
        .notifier(MockNotifier::default())
        .build();

    let handle = Scheduler::start(coordinator, criteria(), HOUR).unwrap();

    let state = handle
        .wait_for(|s| matches!(s.phase, SchedulePhase::Waiting { .. }))
        .await;
    assert_eq!(state.runs_completed, 1);
    assert_eq!(state.last_status, Some(RunStatus::Failure));

    handle.cancel();
    assert_eq!(handle.state().phase, SchedulePhase::Cancelled);

    tokio::time::sleep(10 * HOUR).await;
    assert_eq!(discover_calls.lock().unwrap().len(), 1);

    let state = handle.join().await.unwrap();
    assert_eq!(state.runs_completed, 1);
}
