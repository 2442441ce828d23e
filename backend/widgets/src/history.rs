//! History sidebar.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};

use inkread_core::{Conversion, ConversionId};
use inkread_session::{ConversionController, SessionSnapshot};

const PREVIEW_CHARS: usize = 60;

/// Month, day and time, e.g. `Mar 4, 09:15 AM`.
pub fn created_label<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%b %-d, %I:%M %p").to_string()
}

/// First line of the display text, cut to fit one row.
fn preview(conversion: &Conversion) -> String {
    let text = conversion.display_text().trim();
    if text.is_empty() {
        return "No text".to_string();
    }
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS {
        let cut: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub id: ConversionId,
    pub preview: String,
    pub created_label: String,
    pub edited: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryView {
    Loading,
    Empty,
    Rows(Vec<HistoryRow>),
}

/// Which part of a row was activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTarget {
    Body,
    DeleteIcon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    Select(ConversionId),
    Delete(ConversionId),
}

impl HistoryView {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        Self::build(
            &snapshot.history,
            snapshot.history_loading,
            snapshot.current_id(),
        )
    }

    pub fn build(entries: &[Conversion], loading: bool, selected: Option<&ConversionId>) -> Self {
        if loading {
            return HistoryView::Loading;
        }
        if entries.is_empty() {
            return HistoryView::Empty;
        }
        HistoryView::Rows(
            entries
                .iter()
                .map(|c| HistoryRow {
                    id: c.id.clone(),
                    preview: preview(c),
                    created_label: created_label(&c.created_at.with_timezone(&Local)),
                    edited: c.is_edited(),
                    selected: selected == Some(&c.id),
                })
                .collect(),
        )
    }

    pub fn rows(&self) -> &[HistoryRow] {
        match self {
            HistoryView::Rows(rows) => rows,
            _ => &[],
        }
    }

    /// Placeholder text for the non-list states.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            HistoryView::Loading => Some("Loading..."),
            HistoryView::Empty => Some("No conversions yet"),
            HistoryView::Rows(_) => None,
        }
    }

    /// The delete icon never also selects its row.
    pub fn activate(&self, index: usize, target: RowTarget) -> Option<HistoryAction> {
        let row = self.rows().get(index)?;
        Some(match target {
            RowTarget::Body => HistoryAction::Select(row.id.clone()),
            RowTarget::DeleteIcon => HistoryAction::Delete(row.id.clone()),
        })
    }
}

/// Forward a history action to the controller. Returns whether it took effect.
pub async fn dispatch(controller: &ConversionController, action: HistoryAction) -> bool {
    match action {
        HistoryAction::Select(id) => controller.select_conversion(&id).await,
        HistoryAction::Delete(id) => {
            controller.delete_conversion(&id).await == inkread_session::DeleteOutcome::Deleted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use inkread_core::ImageData;
    use inkread_ocr::MockOcrClient;
    use inkread_session::Phase;
    use inkread_store::InMemoryConversionStore;

    fn record(id: &str, extracted: &str, edited: Option<&str>) -> Conversion {
        Conversion {
            id: id.into(),
            image_source: ImageData::from_base64("image/png", "AAAA"),
            extracted_text: extracted.into(),
            edited_text: edited.map(str::to_string),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn states_follow_loading_and_emptiness() {
        assert_eq!(HistoryView::build(&[], true, None), HistoryView::Loading);
        let empty = HistoryView::build(&[], false, None);
        assert_eq!(empty.placeholder(), Some("No conversions yet"));
        assert!(empty.rows().is_empty());
    }

    #[test]
    fn preview_uses_display_text() {
        let view = HistoryView::build(
            &[
                record("a", "raw", Some("fixed")),
                record("b", "   ", None),
                record("c", "first line\nsecond", Some("")),
            ],
            false,
            Some(&"a".into()),
        );
        let rows = view.rows();
        assert_eq!(rows[0].preview, "fixed");
        assert!(rows[0].edited && rows[0].selected);
        assert_eq!(rows[1].preview, "No text");
        assert_eq!(rows[2].preview, "No text");
    }

    #[test]
    fn empty_edit_is_not_masked_by_extracted_text() {
        let conversion = record("c1", "Hello World", Some(""));
        let view = HistoryView::build(std::slice::from_ref(&conversion), false, None);
        assert_eq!(conversion.display_text(), "");
        assert_eq!(view.rows()[0].preview, "No text");

        let multi = record("c2", "ignored", Some("  first line\nsecond"));
        let view = HistoryView::build(&[multi], false, None);
        assert_eq!(view.rows()[0].preview, "first line");
    }

    #[test]
    fn long_preview_is_cut() {
        let long = "x".repeat(100);
        let view = HistoryView::build(&[record("a", &long, None)], false, None);
        assert_eq!(view.rows()[0].preview.len(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn label_shows_month_day_and_time() {
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 21, 5, 0).unwrap();
        assert_eq!(created_label(&at), "Mar 4, 09:05 PM");
    }

    #[test]
    fn delete_icon_does_not_select() {
        let view = HistoryView::build(&[record("a", "t", None)], false, None);
        assert_eq!(
            view.activate(0, RowTarget::DeleteIcon),
            Some(HistoryAction::Delete("a".into()))
        );
        assert_eq!(
            view.activate(0, RowTarget::Body),
            Some(HistoryAction::Select("a".into()))
        );
        assert_eq!(view.activate(5, RowTarget::Body), None);
    }

    #[tokio::test]
    async fn fresh_session_shows_loading_not_empty() {
        let controller = ConversionController::new(
            Arc::new(MockOcrClient::new()),
            Arc::new(InMemoryConversionStore::new()),
        );
        let view = HistoryView::from_snapshot(&controller.snapshot().await);
        assert_eq!(view.placeholder(), Some("Loading..."));

        controller.load_history().await.unwrap();
        let view = HistoryView::from_snapshot(&controller.snapshot().await);
        assert_eq!(view.placeholder(), Some("No conversions yet"));
    }

    #[tokio::test]
    async fn dispatch_drives_controller() {
        let controller = ConversionController::new(
            Arc::new(MockOcrClient::new()),
            Arc::new(InMemoryConversionStore::new()),
        );
        controller
            .submit_image(ImageData::from_base64("image/png", "AAAA"))
            .await;
        controller
            .submit_image(ImageData::from_base64("image/png", "BBBB"))
            .await;
        controller.load_history().await.unwrap();

        let view = HistoryView::from_snapshot(&controller.snapshot().await);
        // Newest first: c2, c1.
        let action = view.activate(1, RowTarget::Body).unwrap();
        assert!(dispatch(&controller, action).await);
        assert_eq!(
            controller.snapshot().await.current_id().map(|id| id.as_str()),
            Some("c1")
        );

        let action = view.activate(1, RowTarget::DeleteIcon).unwrap();
        assert!(dispatch(&controller, action).await);
        assert_eq!(controller.phase().await, Phase::Idle);
    }
}
