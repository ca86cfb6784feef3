//! The autoposter pipeline: topic selection, schedule arithmetic, and the
//! periodic sweeps that drive the post lifecycle.
//!
//! Sweeps communicate only through post state in the store; they never call
//! each other. Cross-sweep races resolve entirely through the conditional
//! writes in `autopost-db`.

mod cutoff;
mod generate;
mod notify;
mod outcome;
mod publish;
mod schedule;
mod schedule_posts;
mod topic;

pub use cutoff::run_cutoff_sweep;
pub use generate::{run_generate_sweep, GenerateContext};
pub use outcome::{SweepError, SweepItem, SweepOutcome};
pub use publish::{run_publish_sweep, PublishContext};
pub use schedule::{
    generation_window, review_deadline_for, upcoming_slots, GENERATION_WINDOW_HOURS,
    SCHEDULE_HORIZON_DAYS,
};
pub use schedule_posts::run_schedule_sweep;
pub use topic::{choose_topic, select_topic, TopicSelection, TopicSource};
