use lottie_data::Document;
use tracing::info;

use crate::command::EditCommand;
use crate::presenter::EditorView;
use crate::trim::TrimBounds;
use crate::walker::WalkLimits;
use crate::{CommandError, StructureMismatch};

/// The editing context of one interactive client.
///
/// Holds the document as loaded plus the working copy that commands
/// mutate. Commands are applied to a copy first and only committed when
/// every one of them addressed something that exists.
#[derive(Debug, Clone)]
pub struct EditSession {
    original: Document,
    working: Document,
    trim: TrimBounds,
    limits: WalkLimits,
}

/// A document produced by applying commands, with any skipped-field warnings.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub document: Document,
    pub warnings: Vec<StructureMismatch>,
}

impl EditSession {
    pub fn new(document: Document) -> Self {
        Self::with_limits(document, WalkLimits::default())
    }

    pub fn with_limits(document: Document, limits: WalkLimits) -> Self {
        info!(
            layers = document.layer_count(),
            frames = document.total_frames(),
            "editing session opened"
        );
        Self {
            trim: TrimBounds::of(&document),
            working: document.clone(),
            original: document,
            limits,
        }
    }

    pub fn document(&self) -> &Document {
        &self.working
    }

    pub fn original(&self) -> &Document {
        &self.original
    }

    pub fn trim_bounds(&self) -> TrimBounds {
        self.trim
    }

    pub fn limits(&self) -> &WalkLimits {
        &self.limits
    }

    /// Applies `commands` to a copy of the working document.
    pub fn preview(&self, commands: &[EditCommand]) -> Result<EditOutcome, CommandError> {
        let mut document = self.working.clone();
        let mut warnings = Vec::new();
        for command in commands {
            warnings.extend(command.apply(&mut document, &self.trim)?);
        }
        Ok(EditOutcome { document, warnings })
    }

    /// Applies `commands` and commits the result.
    ///
    /// On error the working document is left as it was.
    pub fn apply(
        &mut self,
        commands: &[EditCommand],
    ) -> Result<Vec<StructureMismatch>, CommandError> {
        let outcome = self.preview(commands)?;
        self.working = outcome.document;
        Ok(outcome.warnings)
    }

    /// Discards all edits.
    pub fn reset(&mut self) {
        self.working = self.original.clone();
    }

    pub fn is_modified(&self) -> bool {
        self.working != self.original
    }

    pub fn view(&self, selected_layer: usize) -> EditorView {
        EditorView::build(&self.working, selected_layer, &self.trim, &self.limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> EditSession {
        EditSession::new(
            Document::from_value(json!({
                "ip": 0, "op": 30, "fr": 30,
                "layers": [{ "ty": 4, "nm": "A", "ks": { "r": { "a": 0, "k": 0 } } }]
            }))
            .unwrap(),
        )
    }

    #[test]
    fn preview_does_not_touch_the_working_copy() {
        let session = session();
        let outcome = session
            .preview(&[EditCommand::SetRotation {
                layer: 0,
                degrees: 90.0,
            }])
            .unwrap();
        assert_eq!(outcome.document.layer(0).unwrap()["ks"]["r"]["k"], json!(90.0));
        assert!(!session.is_modified());
    }

    #[test]
    fn failed_batches_are_not_committed() {
        let mut session = session();
        let err = session
            .apply(&[
                EditCommand::SetLayerName {
                    layer: 0,
                    name: "B".into(),
                },
                EditCommand::SetLayerName {
                    layer: 1,
                    name: "C".into(),
                },
            ])
            .unwrap_err();
        assert_eq!(err, CommandError::LayerOutOfRange { index: 1, count: 1 });
        assert!(!session.is_modified());
    }

    #[test]
    fn apply_then_reset() {
        let mut session = session();
        session
            .apply(&[EditCommand::SetLayerName {
                layer: 0,
                name: "B".into(),
            }])
            .unwrap();
        assert!(session.is_modified());
        assert_eq!(session.view(0).layers[0].name, "B");

        session.reset();
        assert!(!session.is_modified());
        assert_eq!(session.document(), session.original());
    }

    #[test]
    fn trim_bounds_survive_trims() {
        let mut session = session();
        for (start, end) in [(10.0, 12.0), (0.0, 30.0)] {
            session.apply(&[EditCommand::Trim { start, end }]).unwrap();
        }
        assert_eq!(session.document().out_point(), 30.0);
        assert_eq!(session.trim_bounds().total, 30.0);
    }
}
