//! Subcommand implementations
//!
//! Each function reads its inputs from disk and returns the text to print.
//! The process exit status is decided by the caller from the returned
//! [`Outcome`].

use anyhow::{Context, Result};
use form_model::{EncodedDocument, FormDocument, IdSource, SequentialIds, UlidIds};
use form_mutation::{apply_batch, command_schema, parse_commands};
use form_validation::{check_answer_keys, report, Answers};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Output and success flag of a subcommand
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) output: String,
    pub(crate) success: bool,
}

impl Outcome {
    fn ok(output: String) -> Self {
        Self {
            output,
            success: true,
        }
    }
}

/// Which generator assigns ids to inserted sections and fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdScheme {
    Ulid,
    Sequential,
}

impl IdScheme {
    fn source(self) -> Box<dyn IdSource> {
        match self {
            Self::Ulid => Box::new(UlidIds),
            Self::Sequential => Box::new(SequentialIds::new()),
        }
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_json(path: &Path) -> Result<Value> {
    serde_json::from_str(&read(path)?).with_context(|| format!("{} is not valid JSON", path.display()))
}

pub(crate) fn load_document(path: &Path) -> Result<FormDocument> {
    EncodedDocument::from_stored(read(path)?)
        .decode()
        .with_context(|| format!("{} is not a valid form document", path.display()))
}

#[derive(Serialize)]
struct Summary {
    sections: usize,
    fields: usize,
    interactive: usize,
    required: usize,
    content_hash: String,
}

/// Decode a document and summarize it
pub(crate) fn check(path: &Path, json: bool) -> Result<Outcome> {
    let document = load_document(path)?;
    let summary = Summary {
        sections: document.section_count(),
        fields: document.field_count(),
        interactive: document.interactive_fields().count(),
        required: document.fields().filter(|f| f.kind.is_required()).count(),
        content_hash: document.content_hash()?.to_string(),
    };
    tracing::debug!(path = %path.display(), sections = summary.sections, "Document checked");

    if json {
        return Ok(Outcome::ok(serde_json::to_string_pretty(&summary)?));
    }
    let mut out = format!(
        "{} section(s), {} field(s) ({} interactive, {} required)\ncontent hash: {}",
        summary.sections, summary.fields, summary.interactive, summary.required, summary.content_hash
    );
    for section in document.sections() {
        out.push_str(&format!("\n  [{}] {}", section.id, section.title));
        for field in &section.elements {
            let marker = if field.kind.is_required() { " *" } else { "" };
            out.push_str(&format!(
                "\n    {} {}{}",
                field.field_type(),
                field.kind.label().unwrap_or(field.id.as_str()),
                marker
            ));
        }
    }
    Ok(Outcome::ok(out))
}

/// Apply a command file (one command or an array) as an atomic batch
pub(crate) fn apply(document: &Path, commands: &Path, ids: IdScheme) -> Result<Outcome> {
    let current = load_document(document)?;
    let commands = parse_commands(&read_json(commands)?)?;
    let mut ids = ids.source();
    let next = apply_batch(&current, &commands, ids.as_mut())?;
    tracing::info!(
        commands = commands.len(),
        fields = next.field_count(),
        "Commands applied"
    );
    Ok(Outcome::ok(next.encode()?.as_str().to_string()))
}

/// Validate an answers file (`{field_id: string}`) against a document
pub(crate) fn validate(document: &Path, answers: &Path) -> Result<Outcome> {
    let document = load_document(document)?;
    let answers: Answers = serde_json::from_value(read_json(answers)?)
        .context("answers must be an object of string values")?;
    check_answer_keys(&document, &answers)?;

    let report = report(&document, &answers);
    let mut out = String::new();
    for (id, passed) in report.result.iter() {
        match report.message_for(id) {
            Some(message) if !passed => out.push_str(&format!("FAIL {id}: {message}\n")),
            _ => out.push_str(&format!("ok   {id}\n")),
        }
    }
    out.push_str(if report.is_acceptable() {
        "submission acceptable"
    } else {
        "submission rejected"
    });
    Ok(Outcome {
        output: out,
        success: report.is_acceptable(),
    })
}

/// Pretty-printed command JSON Schema
pub(crate) fn schema() -> Result<Outcome> {
    Ok(Outcome::ok(serde_json::to_string_pretty(command_schema())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_test_utils::contact_form;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn contact_file(dir: &TempDir) -> std::path::PathBuf {
        write(dir, "form.json", contact_form().encode().unwrap().as_str())
    }

    #[test]
    fn check_summarizes_document() {
        let dir = TempDir::new().unwrap();
        let path = contact_file(&dir);

        let outcome = check(&path, true).unwrap();
        let summary: Value = serde_json::from_str(&outcome.output).unwrap();
        assert_eq!(summary["sections"], 2);
        assert_eq!(summary["fields"], 10);
        assert_eq!(summary["interactive"], 8);
        assert_eq!(summary["required"], 3);

        let text = check(&path, false).unwrap().output;
        assert!(text.contains("[about]"));
        assert!(text.contains("Phone"));
    }

    #[test]
    fn check_rejects_malformed_documents() {
        let dir = TempDir::new().unwrap();
        let empty = write(&dir, "empty.json", "[]");
        assert!(check(&empty, false).is_err());
        let garbage = write(&dir, "garbage.json", "{not json");
        assert!(check(&garbage, false).is_err());
    }

    #[test]
    fn apply_writes_new_document() {
        let dir = TempDir::new().unwrap();
        let doc = contact_file(&dir);
        let commands = write(
            &dir,
            "commands.json",
            &json!([
                {"type": "reorderSections", "sectionIds": ["contact", "about"]},
                {"type": "deleteFields", "fieldIds": ["notes"]}
            ])
            .to_string(),
        );

        let outcome = apply(&doc, &commands, IdScheme::Sequential).unwrap();
        let next = EncodedDocument::from_stored(outcome.output).decode().unwrap();
        assert_eq!(next.section_ids()[0].as_str(), "contact");
        assert_eq!(next.field_count(), 9);
    }

    #[test]
    fn apply_fails_atomically_on_bad_command() {
        let dir = TempDir::new().unwrap();
        let doc = contact_file(&dir);
        let commands = write(
            &dir,
            "commands.json",
            &json!({"type": "reorderSections", "sectionIds": ["about"]}).to_string(),
        );
        let err = apply(&doc, &commands, IdScheme::Ulid).unwrap_err();
        assert!(err.to_string().contains("reorder"));
    }

    #[test]
    fn validate_reports_each_field() {
        let dir = TempDir::new().unwrap();
        let doc = contact_file(&dir);
        let answers = write(
            &dir,
            "answers.json",
            &json!({"name": "Ada", "age": "old", "phone": "+44 20 7946 0958", "consent": "yes"})
                .to_string(),
        );

        let outcome = validate(&doc, &answers).unwrap();
        assert!(!outcome.success);
        assert!(outcome.output.contains("FAIL age: value must be a number"));
        assert!(outcome.output.contains("ok   name"));

        let unknown = write(&dir, "unknown.json", &json!({"ghost": "x"}).to_string());
        assert!(validate(&doc, &unknown).is_err());
    }

    #[test]
    fn schema_lists_every_command() {
        let text = schema().unwrap().output;
        for name in [
            "addElementsToSection",
            "createSection",
            "deleteFields",
            "updateField",
            "replaceForm",
            "reorderFields",
            "reorderSections",
        ] {
            assert!(text.contains(name), "missing {name}");
        }
    }
}
