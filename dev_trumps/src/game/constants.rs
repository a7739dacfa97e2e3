use std::time::Duration;

/// Number of stats printed on every card.
pub const STAT_COUNT: usize = 6;

/// Highest possible stat score. Scores are normalized to `0..=MAX_SCORE`
/// before a card ever reaches the engine.
pub const MAX_SCORE: u8 = 100;

/// Smallest hand either side can be dealt.
pub const MIN_HAND_SIZE: usize = 1;

/// Cards per side in a single-player match.
pub const DEFAULT_SOLO_HAND_SIZE: usize = 12;

/// Cards per side in a peer-to-peer match.
pub const DEFAULT_DUEL_HAND_SIZE: usize = 16;

/// Time the opponent's card stays face-up before the comparison is shown.
pub const DEFAULT_REVEAL_DWELL: Duration = Duration::from_millis(800);

/// Time a resolved round stays on screen before the next round begins.
pub const DEFAULT_POST_RESULT_DELAY: Duration = Duration::from_millis(3500);

/// Time the computer opponent "thinks" before leading a round.
pub const DEFAULT_THINK_TIME: Duration = Duration::from_millis(2000);

/// Connection attempts that don't open within this window are aborted.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Lifetime of transient lobby notices.
pub const DEFAULT_NOTICE_LIFETIME: Duration = Duration::from_secs(5);

/// Upper bound on waiting for round commentary.
pub const DEFAULT_COMMENTARY_TIMEOUT: Duration = Duration::from_secs(1);
