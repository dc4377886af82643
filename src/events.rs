use crate::session::AnsweredQuestion;

/// Events delivered from background tasks to the UI loop
#[derive(Debug)]
pub enum AppEvent {
    /// A flow round trip finished
    Reply(AnsweredQuestion),
}
