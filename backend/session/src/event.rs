use crate::report::Notice;

/// Change notifications for whatever renders the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PhaseChanged { phase: &'static str },
    HistoryChanged { len: usize },
    HistoryLoading { loading: bool },
    SavingChanged { saving: bool },
    Notice(Notice),
    NoticeCleared,
}
