pub mod schedule_dag;

pub use schedule_dag::{Link, ScheduleDag, ScheduleNode};
