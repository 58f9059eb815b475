//! Form editor
//!
//! [`FormEditor`] owns the document of one form for one client session.
//! Human edits and AI tool calls go through the same command protocol;
//! every successful change replaces the document with a new value, keeps
//! the previous one for a single undo step, and is forwarded to the
//! attached [`AutoSaver`].

use crate::chat::{Caller, ChatRole, ChatSession, MessageId};
use crate::error::FormError;
use form_model::{FormDocument, FormId, IdSource};
use form_mutation::{apply_batch, parse_commands, MutationCommand};
use form_persistence::{AutoSaveConfig, AutoSaver, DocumentStore, SaveStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// First-open form setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSetup {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FormSetup {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Editing session over one form document
pub struct FormEditor {
    form_id: FormId,
    setup: Option<FormSetup>,
    document: FormDocument,
    previous: Option<FormDocument>,
    ids: Box<dyn IdSource + Send>,
    autosaver: Option<AutoSaver>,
}

impl std::fmt::Debug for FormEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormEditor")
            .field("form_id", &self.form_id)
            .field("sections", &self.document.section_count())
            .field("can_undo", &self.can_undo())
            .field("autosave", &self.autosaver.is_some())
            .finish_non_exhaustive()
    }
}

impl FormEditor {
    /// Set up a new form: one blank section
    ///
    /// # Errors
    /// `InvalidSetup` if the name is blank
    pub fn open(
        form_id: FormId,
        setup: FormSetup,
        mut ids: Box<dyn IdSource + Send>,
    ) -> Result<Self, FormError> {
        if setup.name.trim().is_empty() {
            return Err(FormError::InvalidSetup("form name is required".to_string()));
        }
        let document = FormDocument::blank(ids.next_section_id());
        tracing::info!(form_id = %form_id, name = %setup.name, "Form created");
        Ok(Self {
            form_id,
            setup: Some(setup),
            document,
            previous: None,
            ids,
            autosaver: None,
        })
    }

    /// Resume editing an existing document
    #[must_use]
    pub fn from_document(
        form_id: FormId,
        document: FormDocument,
        ids: Box<dyn IdSource + Send>,
    ) -> Self {
        Self {
            form_id,
            setup: None,
            document,
            previous: None,
            ids,
            autosaver: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn form_id(&self) -> &FormId {
        &self.form_id
    }

    /// Setup given at creation (absent for resumed documents)
    #[inline]
    #[must_use]
    pub fn setup(&self) -> Option<&FormSetup> {
        self.setup.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn document(&self) -> &FormDocument {
        &self.document
    }

    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.previous.is_some()
    }

    /// Apply one command
    ///
    /// # Errors
    /// The command's structural error; the document is unchanged
    pub fn apply(&mut self, command: &MutationCommand) -> Result<&FormDocument, FormError> {
        let next = command.apply(&self.document, self.ids.as_mut())?;
        self.commit(next);
        Ok(&self.document)
    }

    /// Apply commands in order as one change (one undo step)
    ///
    /// # Errors
    /// `Batch { index, .. }` for the first failing command; nothing applied
    pub fn apply_batch(&mut self, commands: &[MutationCommand]) -> Result<&FormDocument, FormError> {
        let next = apply_batch(&self.document, commands, self.ids.as_mut())?;
        self.commit(next);
        Ok(&self.document)
    }

    /// Apply raw tool-call JSON: a single command object or an array
    ///
    /// # Errors
    /// `SchemaValidationFailure` before anything is decoded, or the
    /// structural error of the batch
    pub fn apply_tool_call(&mut self, raw: &Value) -> Result<&FormDocument, FormError> {
        let commands = parse_commands(raw)?;
        self.apply_batch(&commands)
    }

    /// Restore the document as it was before the last change
    ///
    /// Returns false when there is nothing to undo. Only one step is kept.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.previous.take() else {
            return false;
        };
        self.document = previous;
        tracing::debug!(form_id = %self.form_id, "Undo");
        self.notify();
        true
    }

    /// Apply the tool calls of an assistant message
    ///
    /// The caller must own the session and the session must target this
    /// form. All tool calls are applied as one batch. Applying a message
    /// whose actions were already applied does nothing and returns 0.
    ///
    /// # Errors
    /// `AuthorizationFailure`, `MessageNotFound`, `NotAssistantMessage`,
    /// or a mutation error; none of them change the document or the flag
    pub fn apply_assistant_actions(
        &mut self,
        caller: &Caller,
        session: &mut ChatSession,
        message_id: MessageId,
    ) -> Result<usize, FormError> {
        if caller.user_id != session.user_id {
            tracing::warn!(user = %caller.user_id, session = %session.id, "Caller does not own session");
            return Err(FormError::AuthorizationFailure(format!(
                "user {} does not own chat session {}",
                caller.user_id, session.id
            )));
        }
        if session.form_id != self.form_id {
            return Err(FormError::AuthorizationFailure(format!(
                "chat session {} belongs to form {}",
                session.id, session.form_id
            )));
        }

        let message = session
            .message_mut(message_id)
            .ok_or(FormError::MessageNotFound(message_id))?;
        if message.role != ChatRole::Assistant {
            return Err(FormError::NotAssistantMessage(message_id));
        }
        if message.actions_applied {
            tracing::debug!(message = %message_id, "Actions already applied");
            return Ok(0);
        }

        let mut commands = Vec::new();
        for call in &message.tool_calls {
            commands.extend(parse_commands(call)?);
        }
        if !commands.is_empty() {
            let next = apply_batch(&self.document, &commands, self.ids.as_mut())?;
            self.commit(next);
        }
        message.actions_applied = true;
        tracing::info!(
            form_id = %self.form_id,
            message = %message_id,
            commands = commands.len(),
            "Applied assistant actions"
        );
        Ok(commands.len())
    }

    /// Start a persistence pipeline over `store` and attach it
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_autosave(&mut self, store: Arc<dyn DocumentStore>, config: AutoSaveConfig) {
        let saver = AutoSaver::spawn(self.form_id.clone(), store, config);
        self.attach_autosaver(saver);
    }

    /// Attach a pipeline; the current document becomes its baseline
    pub fn attach_autosaver(&mut self, saver: AutoSaver) {
        saver.on_mutation(&self.document);
        if let Some(old) = self.autosaver.replace(saver) {
            tracing::warn!(form_id = %old.form_id(), "Replaced attached auto-saver");
        }
    }

    /// Detach the pipeline (for example to shut it down)
    pub fn detach_autosaver(&mut self) -> Option<AutoSaver> {
        self.autosaver.take()
    }

    /// Request an immediate save; no-op without a pipeline
    pub fn save_now(&self) {
        if let Some(saver) = &self.autosaver {
            saver.save_now();
        }
    }

    /// Pipeline status (`Idle` without a pipeline)
    #[must_use]
    pub fn save_status(&self) -> SaveStatus {
        self.autosaver
            .as_ref()
            .map_or(SaveStatus::Idle, AutoSaver::status)
    }

    fn commit(&mut self, next: FormDocument) {
        self.previous = Some(std::mem::replace(&mut self.document, next));
        self.notify();
    }

    fn notify(&self) {
        if let Some(saver) = &self.autosaver {
            saver.on_mutation(&self.document);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::UserId;
    use form_model::{FieldId, FieldType, SectionId, SequentialIds};
    use form_mutation::{FieldInput, FieldUpdate, MutationError};
    use form_persistence::MemoryDocumentStore;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map};
    use std::time::Duration;

    fn editor() -> FormEditor {
        FormEditor::open(
            FormId::new("f1"),
            FormSetup::new("Contact"),
            Box::new(SequentialIds::new()),
        )
        .unwrap()
    }

    fn add_phone(section: &str) -> MutationCommand {
        MutationCommand::AddElementsToSection {
            section_id: SectionId::new(section),
            elements: vec![FieldInput::new(FieldType::Phone)],
            insert_after_field_id: None,
        }
    }

    #[test]
    fn open_requires_a_name() {
        let err = FormEditor::open(
            FormId::new("f1"),
            FormSetup::new("   "),
            Box::new(SequentialIds::new()),
        )
        .unwrap_err();
        assert!(matches!(err, FormError::InvalidSetup(_)));

        let editor = editor();
        assert_eq!(editor.document().section_ids(), vec![SectionId::new("section-1")]);
        assert_eq!(editor.setup().map(|s| s.name.as_str()), Some("Contact"));
        assert!(!editor.can_undo());
    }

    #[test]
    fn add_required_text_field() {
        let mut editor = editor();
        let command = MutationCommand::AddElementsToSection {
            section_id: SectionId::new("section-1"),
            elements: vec![FieldInput::new(FieldType::TextField)
                .with_attribute("label", "Name")
                .with_attribute("required", true)],
            insert_after_field_id: None,
        };
        let doc = editor.apply(&command).unwrap();

        let section = doc.section(&SectionId::new("section-1")).unwrap();
        assert_eq!(section.elements.len(), 1);
        let field = &section.elements[0];
        assert_eq!(field.field_type(), FieldType::TextField);
        assert!(field.kind.is_required());
        assert_eq!(field.kind.label(), Some("Name"));
    }

    #[test]
    fn making_checkbox_required_changes_validation() {
        let mut editor = editor();
        editor
            .apply(&MutationCommand::AddElementsToSection {
                section_id: SectionId::new("section-1"),
                elements: vec![FieldInput::new(FieldType::Checkbox)],
                insert_after_field_id: None,
            })
            .unwrap();
        let id = FieldId::new("field-1");
        assert!(editor.document().field(&id).unwrap().validate("false"));

        let mut attrs = Map::new();
        attrs.insert("required".into(), json!(true));
        editor
            .apply(&MutationCommand::UpdateField {
                field_id: id.clone(),
                updates: FieldUpdate::attributes(attrs),
            })
            .unwrap();

        let field = editor.document().field(&id).unwrap();
        assert!(!field.validate("false"));
        assert!(field.validate("true"));
    }

    #[test]
    fn failed_command_leaves_document_and_undo_untouched() {
        let mut editor = editor();
        editor.apply(&add_phone("section-1")).unwrap();
        let before = editor.document().clone();

        let err = editor.apply(&add_phone("missing")).unwrap_err();
        assert_eq!(
            err.mutation(),
            Some(&MutationError::SectionNotFound(SectionId::new("missing")))
        );
        assert_eq!(editor.document(), &before);

        assert!(editor.undo());
        assert_eq!(editor.document().field_count(), 0);
    }

    #[test]
    fn undo_is_single_step() {
        let mut editor = editor();
        editor.apply(&add_phone("section-1")).unwrap();
        editor.apply(&add_phone("section-1")).unwrap();

        assert!(editor.undo());
        assert_eq!(editor.document().field_count(), 1);
        assert!(!editor.undo());
        assert_eq!(editor.document().field_count(), 1);
    }

    #[test]
    fn batch_is_one_undo_step_and_atomic() {
        let mut editor = editor();
        editor
            .apply_batch(&[add_phone("section-1"), add_phone("section-1")])
            .unwrap();
        assert_eq!(editor.document().field_count(), 2);

        let before = editor.document().clone();
        let err = editor
            .apply_batch(&[add_phone("section-1"), add_phone("nope")])
            .unwrap_err();
        assert!(matches!(
            err,
            FormError::Mutation(MutationError::Batch { index: 1, .. })
        ));
        assert_eq!(editor.document(), &before);

        assert!(editor.undo());
        assert_eq!(editor.document().field_count(), 0);
    }

    #[test]
    fn tool_call_shape_is_checked_first() {
        let mut editor = editor();
        let err = editor
            .apply_tool_call(&json!({"type": "reorderSections"}))
            .unwrap_err();
        assert!(matches!(
            err.mutation(),
            Some(MutationError::SchemaValidationFailure(_))
        ));

        editor
            .apply_tool_call(&json!([
                {"type": "createSection", "section": {"title": "Details", "elements": []}},
                {"type": "addElementsToSection", "sectionId": "section-1",
                 "elements": [{"type": "YesNo"}]}
            ]))
            .unwrap();
        assert_eq!(editor.document().section_count(), 2);
        assert_eq!(editor.document().field_count(), 1);
    }

    fn session_with_actions(user: &str, form: &str) -> (ChatSession, MessageId) {
        let mut session = ChatSession::new(UserId::new(user), FormId::new(form));
        session.push_user("Add a phone number and a yes/no question");
        let id = session.push_assistant(
            "Added both",
            vec![
                json!({"type": "addElementsToSection", "sectionId": "section-1",
                       "elements": [{"type": "Phone"}]}),
                json!([{"type": "addElementsToSection", "sectionId": "section-1",
                        "elements": [{"type": "YesNo"}]}]),
            ],
        );
        (session, id)
    }

    #[test]
    fn assistant_actions_apply_once() {
        let mut editor = editor();
        let (mut session, id) = session_with_actions("u1", "f1");
        let caller = Caller::new("u1");

        assert_eq!(editor.apply_assistant_actions(&caller, &mut session, id).unwrap(), 2);
        assert!(session.message(id).unwrap().actions_applied);
        assert_eq!(editor.document().field_count(), 2);

        assert_eq!(editor.apply_assistant_actions(&caller, &mut session, id).unwrap(), 0);
        assert_eq!(editor.document().field_count(), 2);
    }

    #[test]
    fn assistant_actions_require_authorization() {
        let mut editor = editor();

        let (mut session, id) = session_with_actions("u1", "f1");
        let err = editor
            .apply_assistant_actions(&Caller::new("intruder"), &mut session, id)
            .unwrap_err();
        assert!(matches!(err, FormError::AuthorizationFailure(_)));
        assert!(!session.message(id).unwrap().actions_applied);

        let (mut other_form, id) = session_with_actions("u1", "f2");
        let err = editor
            .apply_assistant_actions(&Caller::new("u1"), &mut other_form, id)
            .unwrap_err();
        assert!(matches!(err, FormError::AuthorizationFailure(_)));
        assert_eq!(editor.document().field_count(), 0);
    }

    #[test]
    fn failing_assistant_actions_leave_flag_unset() {
        let mut editor = editor();
        let mut session = ChatSession::new(UserId::new("u1"), FormId::new("f1"));
        let id = session.push_assistant(
            "Reordered",
            vec![json!({"type": "reorderSections", "sectionIds": ["ghost"]})],
        );
        let user_message = session.push_user("thanks");
        let caller = Caller::new("u1");

        assert!(editor.apply_assistant_actions(&caller, &mut session, id).is_err());
        assert!(!session.message(id).unwrap().actions_applied);

        assert!(matches!(
            editor.apply_assistant_actions(&caller, &mut session, user_message),
            Err(FormError::NotAssistantMessage(_))
        ));
        assert!(matches!(
            editor.apply_assistant_actions(&caller, &mut session, MessageId::new()),
            Err(FormError::MessageNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn edits_and_undo_reach_the_pipeline() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mut editor = editor();
        editor.start_autosave(store.clone(), AutoSaveConfig::default());

        editor.apply(&add_phone("section-1")).unwrap();
        editor.save_now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(store.write_count(), 1);

        // Undo back to the baseline is a real change relative to the saved copy
        assert!(editor.undo());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.write_count(), 2);
        let stored = store.get(editor.form_id()).unwrap();
        assert_eq!(&stored.decode().unwrap(), editor.document());

        let saver = editor.detach_autosaver().unwrap();
        saver.shutdown().await;
        assert_eq!(editor.save_status(), SaveStatus::Idle);
    }
}
