use async_trait::async_trait;
use scorebot::commentary::{TextGenerator, FALLBACK_LINES};
use scorebot::config::{AppConfig, ScheduleConfig};
use scorebot::error::{FetchError, GenerationError, PublishError};
use scorebot::publish::{PostReceipt, Publisher, FIXED_TAGS, MAX_POST_CHARS};
use scorebot::scoreboard::ScoreboardSource;
use scorebot::services::{CycleOutcome, CycleState, Orchestrator, PassReport};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const LAKERS_CELTICS_FINAL: &str = r#"
<html><body>
  <div class="scoreboard" data-game-id="401585001" data-date="2024-03-01">
    <span class="game-status">Final</span>
    <span class="team-name">Lakers</span><span class="score">102</span>
    <span class="team-name">Celtics</span><span class="score">98</span>
    <div class="stat"><span class="stat-label">Points</span><span class="stat-value">LeBron 34</span></div>
    <div class="stat"><span class="stat-label">Rebounds</span><span class="stat-value">Davis 15</span></div>
    <div class="injury">Tatum (ankle) questionable</div>
  </div>
</body></html>
"#;

/// Same game without an event id or date attribute
const LAKERS_CELTICS_FINAL_BARE: &str = r#"
<html><body>
  <div class="scoreboard">
    <span class="game-status">Final</span>
    <span class="team-name">Lakers</span><span class="score">102</span>
    <span class="team-name">Celtics</span><span class="score">98</span>
  </div>
</body></html>
"#;

const LAKERS_CELTICS_LIVE: &str = r#"
<html><body>
  <div class="scoreboard" data-game-id="401585001" data-date="2024-03-01">
    <span class="game-status">Q4 2:31</span>
    <span class="team-name">Lakers</span><span class="score">95</span>
    <span class="team-name">Celtics</span><span class="score">93</span>
  </div>
</body></html>
"#;

/// Serves whatever page the test last set
struct FakeBoard {
    page: Mutex<Result<String, u16>>,
}

impl FakeBoard {
    fn serving(html: &str) -> Arc<Self> {
        Arc::new(Self {
            page: Mutex::new(Ok(html.to_string())),
        })
    }

    fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            page: Mutex::new(Err(status)),
        })
    }

    fn set_page(&self, html: &str) {
        *self.page.lock().unwrap() = Ok(html.to_string());
    }
}

#[async_trait]
impl ScoreboardSource for FakeBoard {
    async fn fetch(&self) -> Result<String, FetchError> {
        match &*self.page.lock().unwrap() {
            Ok(html) => Ok(html.clone()),
            Err(status) => Err(FetchError::Status { status: *status }),
        }
    }
}

struct PanickingBoard;

#[async_trait]
impl ScoreboardSource for PanickingBoard {
    async fn fetch(&self) -> Result<String, FetchError> {
        panic!("scoreboard exploded");
    }
}

/// Never answers
struct HangingBoard;

#[async_trait]
impl ScoreboardSource for HangingBoard {
    async fn fetch(&self) -> Result<String, FetchError> {
        std::future::pending().await
    }
}

struct HangingPublisher;

#[async_trait]
impl Publisher for HangingPublisher {
    async fn publish(&self, _text: &str) -> Result<PostReceipt, PublishError> {
        std::future::pending().await
    }
}

struct FixedGenerator(Result<String, ()>);

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, GenerationError> {
        match &self.0 {
            Ok(text) => Ok(text.clone()),
            Err(()) => Err(GenerationError::Api {
                status: 500,
                body: "upstream down".to_string(),
            }),
        }
    }
}

/// Records every post; fails the first `failures` attempts
struct RecordingPublisher {
    posts: Mutex<Vec<String>>,
    failures: Mutex<u32>,
    duplicate: bool,
}

impl RecordingPublisher {
    fn new() -> Arc<Self> {
        Self::failing_first(0)
    }

    fn failing_first(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            posts: Mutex::new(Vec::new()),
            failures: Mutex::new(failures),
            duplicate: false,
        })
    }

    fn rejecting_duplicates() -> Arc<Self> {
        Arc::new(Self {
            posts: Mutex::new(Vec::new()),
            failures: Mutex::new(0),
            duplicate: true,
        })
    }

    fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, text: &str) -> Result<PostReceipt, PublishError> {
        if self.duplicate {
            return Err(PublishError::Duplicate("status is a duplicate".to_string()));
        }
        {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(PublishError::Api {
                    status: 503,
                    body: "over capacity".to_string(),
                });
            }
        }
        let mut posts = self.posts.lock().unwrap();
        posts.push(text.to_string());
        Ok(PostReceipt {
            id: posts.len().to_string(),
        })
    }
}

fn config() -> AppConfig {
    let mut cfg = AppConfig::default_config("nba");
    cfg.publish.dry_run = true;
    cfg.schedule = ScheduleConfig {
        call_timeout_secs: 2,
        ..ScheduleConfig::default()
    };
    cfg.teams
        .arenas
        .insert("Lakers".to_string(), "Crypto.com Arena".to_string());
    cfg.teams
        .hashtags
        .insert("Lakers".to_string(), "LakeShow".to_string());
    cfg
}

fn orchestrator(
    source: Arc<dyn ScoreboardSource>,
    generator: FixedGenerator,
    publisher: Arc<dyn Publisher>,
) -> Orchestrator {
    Orchestrator::from_config(&config(), source, Arc::new(generator), publisher)
        .expect("default selectors compile")
}

fn completed(outcome: CycleOutcome) -> PassReport {
    match outcome {
        CycleOutcome::Completed(report) => report,
        CycleOutcome::Failed(reason) => panic!("cycle failed: {reason}"),
    }
}

/// A final game seen on consecutive polls is posted exactly once.
#[tokio::test]
async fn final_game_is_published_once_across_passes() {
    let publisher = RecordingPublisher::new();
    let mut orch = orchestrator(
        FakeBoard::serving(LAKERS_CELTICS_FINAL),
        FixedGenerator(Ok("Purple and gold, all night long.".to_string())),
        publisher.clone(),
    );

    let first = completed(orch.run_cycle().await);
    let second = completed(orch.run_cycle().await);

    assert_eq!(first.published, 1);
    assert_eq!(second.eligible, 0);
    assert_eq!(second.published, 0);
    assert_eq!(publisher.posts().len(), 1);
    assert!(orch
        .deduplicator()
        .published_at("nba:401585001")
        .is_some());
}

/// The worked Lakers/Celtics example renders every section in order.
#[tokio::test]
async fn lakers_celtics_post_layout() {
    let publisher = RecordingPublisher::new();
    let mut orch = orchestrator(
        FakeBoard::serving(LAKERS_CELTICS_FINAL),
        FixedGenerator(Ok("\"Purple and gold, all night long.\"".to_string())),
        publisher.clone(),
    );

    completed(orch.run_cycle().await);
    let posts = publisher.posts();
    let post = &posts[0];

    assert!(post.starts_with("🏁 FINAL SCORE at Crypto.com Arena:\nLakers 102 - Celtics 98"));
    let stats = post.find("📊 Key Stats:\n• Points: LeBron 34\n• Rebounds: Davis 15").unwrap();
    let injury = post.find("🏥 Injuries:\n• Tatum (ankle) questionable").unwrap();
    let joke = post.find("😄 Purple and gold, all night long.").unwrap();
    let tags = post.find("#LakeShow").unwrap();
    assert!(stats < injury && injury < joke && joke < tags);
    assert!(post.ends_with(FIXED_TAGS));
    assert!(post.chars().count() <= MAX_POST_CHARS);
}

/// A game still in progress is never posted; it goes out once it turns final.
#[tokio::test]
async fn in_progress_game_waits_for_final() {
    let board = FakeBoard::serving(LAKERS_CELTICS_LIVE);
    let publisher = RecordingPublisher::new();
    let mut orch = orchestrator(
        board.clone(),
        FixedGenerator(Ok("Buzzer beater energy.".to_string())),
        publisher.clone(),
    );

    let live = completed(orch.run_cycle().await);
    assert_eq!(live.seen, 1);
    assert_eq!(live.eligible, 0);
    assert!(publisher.posts().is_empty());

    board.set_page(LAKERS_CELTICS_FINAL);
    let fin = completed(orch.run_cycle().await);
    assert_eq!(fin.published, 1);
    assert_eq!(publisher.posts().len(), 1);
}

/// A rejected publish leaves the game eligible, so the next pass retries it.
#[tokio::test]
async fn failed_publish_is_retried_next_pass() {
    let publisher = RecordingPublisher::failing_first(1);
    let mut orch = orchestrator(
        FakeBoard::serving(LAKERS_CELTICS_FINAL),
        FixedGenerator(Ok("Second time lucky.".to_string())),
        publisher.clone(),
    );

    let first = completed(orch.run_cycle().await);
    assert_eq!(first.failed, 1);
    assert_eq!(first.published, 0);
    assert!(orch.deduplicator().is_empty());

    let second = completed(orch.run_cycle().await);
    assert_eq!(second.published, 1);

    let third = completed(orch.run_cycle().await);
    assert_eq!(third.published, 0);
    assert_eq!(publisher.posts().len(), 1);
}

/// A duplicate rejection means an earlier attempt landed; stop retrying.
#[tokio::test]
async fn duplicate_rejection_counts_as_published() {
    let publisher = RecordingPublisher::rejecting_duplicates();
    let mut orch = orchestrator(
        FakeBoard::serving(LAKERS_CELTICS_FINAL),
        FixedGenerator(Ok("Again?".to_string())),
        publisher.clone(),
    );

    let report = completed(orch.run_cycle().await);
    assert_eq!(report.published, 1);
    assert_eq!(orch.deduplicator().len(), 1);

    let again = completed(orch.run_cycle().await);
    assert_eq!(again.eligible, 0);
}

/// A dead generator still produces a post, carrying one of the canned lines.
#[tokio::test]
async fn generator_failure_uses_canned_line() {
    let publisher = RecordingPublisher::new();
    let mut orch = orchestrator(
        FakeBoard::serving(LAKERS_CELTICS_FINAL),
        FixedGenerator(Err(())),
        publisher.clone(),
    );

    completed(orch.run_cycle().await);
    let posts = publisher.posts();
    assert_eq!(posts.len(), 1);
    assert!(
        FALLBACK_LINES.iter().any(|line| posts[0].contains(line)),
        "post should carry a canned line, got: {}",
        posts[0]
    );
}

/// A failed fetch is an empty pass, not an error cycle.
#[tokio::test]
async fn fetch_failure_is_an_empty_pass() {
    let publisher = RecordingPublisher::new();
    let mut orch = orchestrator(
        FakeBoard::failing(503),
        FixedGenerator(Ok("unused".to_string())),
        publisher.clone(),
    );

    let outcome = orch.run_cycle().await;
    let plan = orch.sleep_plan(&outcome);
    let report = completed(outcome);

    assert!(report.fetch_failed);
    assert_eq!(report.seen, 0);
    assert!(publisher.posts().is_empty());
    assert_eq!(plan, vec![Duration::from_secs(60), Duration::from_secs(300)]);
    assert_eq!(orch.state(), CycleState::Sleeping { after_error: false });
}

/// A panic inside a pass becomes a failed cycle followed by the cooldown.
#[tokio::test]
async fn panic_in_pass_enters_cooldown() {
    let mut orch = orchestrator(
        Arc::new(PanickingBoard),
        FixedGenerator(Ok("unused".to_string())),
        RecordingPublisher::new(),
    );

    let outcome = orch.run_cycle().await;
    assert_eq!(
        outcome,
        CycleOutcome::Failed("scoreboard exploded".to_string())
    );
    assert_eq!(orch.state(), CycleState::Sleeping { after_error: true });
    assert_eq!(orch.sleep_plan(&outcome), vec![Duration::from_secs(300)]);
}

/// Containers without two teams and two scores are counted and skipped.
#[tokio::test]
async fn malformed_containers_are_skipped() {
    let page = format!(
        "{}{}",
        r#"<div class="scoreboard"><span class="game-status">Final</span><span class="team-name">Lakers</span></div>"#,
        LAKERS_CELTICS_FINAL
    );
    let publisher = RecordingPublisher::new();
    let mut orch = orchestrator(
        FakeBoard::serving(&page),
        FixedGenerator(Ok("Still counts.".to_string())),
        publisher.clone(),
    );

    let report = completed(orch.run_cycle().await);
    assert_eq!(report.seen, 2);
    assert_eq!(report.invalid, 1);
    assert_eq!(report.published, 1);
}

/// A game with no id or date keeps one identity for as long as it is listed.
#[tokio::test]
async fn bare_container_is_published_once() {
    let publisher = RecordingPublisher::new();
    let mut orch = orchestrator(
        FakeBoard::serving(LAKERS_CELTICS_FINAL_BARE),
        FixedGenerator(Ok("No id, no problem.".to_string())),
        publisher.clone(),
    );

    completed(orch.run_cycle().await);
    completed(orch.run_cycle().await);

    assert_eq!(publisher.posts().len(), 1);
    assert!(orch
        .deduplicator()
        .published_at("nba:lakers-vs-celtics")
        .is_some());
}

/// A game listed twice on one page counts and posts once.
#[tokio::test]
async fn repeated_container_counts_once() {
    let page = format!("{}{}", LAKERS_CELTICS_FINAL, LAKERS_CELTICS_FINAL);
    let publisher = RecordingPublisher::new();
    let mut orch = orchestrator(
        FakeBoard::serving(&page),
        FixedGenerator(Ok("Seeing double.".to_string())),
        publisher.clone(),
    );

    let report = completed(orch.run_cycle().await);
    assert_eq!(report.seen, 2);
    assert_eq!(report.eligible, 1);
    assert_eq!(report.published + report.failed, report.eligible);
    assert_eq!(publisher.posts().len(), 1);
}

/// A scoreboard that never answers is cut off and treated as an empty pass.
#[tokio::test(start_paused = true)]
async fn hung_fetch_is_an_empty_pass() {
    let mut orch = orchestrator(
        Arc::new(HangingBoard),
        FixedGenerator(Ok("unused".to_string())),
        RecordingPublisher::new(),
    );

    let report = completed(orch.run_cycle().await);
    assert!(report.fetch_failed);
    assert_eq!(report.seen, 0);
    assert_eq!(orch.state(), CycleState::Sleeping { after_error: false });
}

/// A publish that never answers is a failure and the game stays eligible.
#[tokio::test(start_paused = true)]
async fn hung_publish_leaves_game_eligible() {
    let mut orch = orchestrator(
        FakeBoard::serving(LAKERS_CELTICS_FINAL),
        FixedGenerator(Ok("Waiting on the wire.".to_string())),
        Arc::new(HangingPublisher),
    );

    let first = completed(orch.run_cycle().await);
    assert_eq!(first.eligible, 1);
    assert_eq!(first.failed, 1);
    assert_eq!(first.published, 0);
    assert!(orch.deduplicator().is_empty());

    let second = completed(orch.run_cycle().await);
    assert_eq!(second.eligible, 1);
    assert_eq!(second.failed, 1);
}
