//! Translation collaborator boundary.
//!
//! The engine never produces translated text itself. A [`Translator`] is asked
//! either to translate a brand-new section or to update an existing
//! translation after its source changed.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TranslationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary {
    pub terms: Vec<GlossaryTerm>,
}

impl Glossary {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse glossary {}", path.display()))
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms whose source form occurs in `text`, compared case-insensitively.
    pub fn relevant_to(&self, text: &str) -> Vec<&GlossaryTerm> {
        let haystack = text.to_lowercase();
        self.terms
            .iter()
            .filter(|term| !term.source.is_empty() && haystack.contains(&term.source.to_lowercase()))
            .collect()
    }
}

pub trait Translator {
    /// Translates a section that has no prior translation.
    fn translate_new(
        &self,
        section_text: &str,
        glossary: Option<&Glossary>,
    ) -> Result<String, TranslationError>;

    /// Revises `current_translation` so it reflects `new_source` instead of
    /// `old_source`.
    fn translate_update(
        &self,
        old_source: &str,
        new_source: &str,
        current_translation: &str,
        glossary: Option<&Glossary>,
    ) -> Result<String, TranslationError>;
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum RequestMode {
    New,
    Update,
}

#[derive(Debug, Serialize)]
struct TranslationRequest<'a> {
    mode: RequestMode,
    source_language: &'a str,
    target_language: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_source: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_source: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_translation: Option<&'a str>,
    glossary: Vec<&'a GlossaryTerm>,
}

/// Runs an external program per request: the JSON request goes to its stdin
/// and the translated text is read back from its stdout.
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    program: String,
    args: Vec<String>,
    source_language: String,
    target_language: String,
}

impl CommandTranslator {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }

    fn run(&self, request: &TranslationRequest<'_>) -> Result<String, TranslationError> {
        let payload = serde_json::to_vec(request)
            .map_err(|err| TranslationError::new(format!("failed to encode request: {err}")))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                TranslationError::new(format!("failed to execute {}: {err}", self.program))
            })?;

        // The request is fed from its own thread while stdout is drained here;
        // a filter that echoes as it reads would otherwise fill both pipes.
        let stdin = child.stdin.take();
        let (output, written) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(&payload),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (output, writer.join())
        });

        let output = output.map_err(|err| {
            TranslationError::new(format!("failed to wait for {}: {err}", self.program))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranslationError::new(format!(
                "{} returned non-zero exit status: {}",
                self.program,
                stderr.trim()
            )));
        }

        match written {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                return Err(TranslationError::new(format!(
                    "failed to write request to {}: {err}",
                    self.program
                )));
            }
            Err(_) => {
                return Err(TranslationError::new(format!(
                    "request writer for {} panicked",
                    self.program
                )));
            }
        }

        let text = String::from_utf8_lossy(&output.stdout).replace('\u{0000}', "");
        if text.trim().is_empty() {
            return Err(TranslationError::new(format!("{} returned no text", self.program)));
        }

        debug!(program = %self.program, bytes = text.len(), "translator responded");
        Ok(text)
    }
}

impl Translator for CommandTranslator {
    fn translate_new(
        &self,
        section_text: &str,
        glossary: Option<&Glossary>,
    ) -> Result<String, TranslationError> {
        self.run(&TranslationRequest {
            mode: RequestMode::New,
            source_language: &self.source_language,
            target_language: &self.target_language,
            text: section_text,
            old_source: None,
            new_source: None,
            current_translation: None,
            glossary: glossary
                .map(|glossary| glossary.relevant_to(section_text))
                .unwrap_or_default(),
        })
    }

    fn translate_update(
        &self,
        old_source: &str,
        new_source: &str,
        current_translation: &str,
        glossary: Option<&Glossary>,
    ) -> Result<String, TranslationError> {
        self.run(&TranslationRequest {
            mode: RequestMode::Update,
            source_language: &self.source_language,
            target_language: &self.target_language,
            text: new_source,
            old_source: Some(old_source),
            new_source: Some(new_source),
            current_translation: Some(current_translation),
            glossary: glossary
                .map(|glossary| glossary.relevant_to(new_source))
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glossary() -> Glossary {
        Glossary {
            terms: vec![
                GlossaryTerm {
                    source: "Supply Curve".to_string(),
                    target: "krzywa podaży".to_string(),
                    note: None,
                },
                GlossaryTerm {
                    source: "elasticity".to_string(),
                    target: "elastyczność".to_string(),
                    note: Some("economics".to_string()),
                },
            ],
        }
    }

    fn shell(script: &str) -> CommandTranslator {
        CommandTranslator::new("sh", vec!["-c".to_string(), script.to_string()], "en", "pl")
    }

    #[test]
    fn relevant_terms_match_case_insensitively() {
        let glossary = glossary();
        let terms = glossary.relevant_to("## The supply curve\n\nShifts.\n");
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].target, "krzywa podaży");
    }

    #[test]
    fn glossary_loads_from_json_array() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("glossary.json");
        fs::write(
            &path,
            r#"[{"source": "elasticity", "target": "elastyczność", "note": "economics"}]"#,
        )
        .unwrap();

        let loaded = Glossary::load(&path).unwrap();
        assert_eq!(loaded.terms, glossary().terms[1..].to_vec());
    }

    #[test]
    fn command_translator_returns_stdout() {
        let translator = shell("cat >/dev/null; printf '## Alfa\\n'");
        assert_eq!(translator.translate_new("## Alpha\n", None).unwrap(), "## Alfa\n");
    }

    #[test]
    fn command_translator_sends_update_request_as_json() {
        let translator = shell("cat");
        let echoed = translator
            .translate_update("## A\n\nold\n", "## A\n\nnew\n", "## Á\n\nstary\n", Some(&glossary()))
            .unwrap();

        let request: serde_json::Value = serde_json::from_str(&echoed).unwrap();
        assert_eq!(request["mode"], "update");
        assert_eq!(request["target_language"], "pl");
        assert_eq!(request["current_translation"], "## Á\n\nstary\n");
        assert_eq!(request["glossary"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn command_translator_streams_large_requests_without_blocking() {
        let translator = shell("cat");
        let section = format!("## Long\n\n{}\n", "x".repeat(300_000));
        let echoed = translator.translate_new(&section, None).unwrap();

        let request: serde_json::Value = serde_json::from_str(&echoed).unwrap();
        assert_eq!(request["mode"], "new");
        assert_eq!(request["text"].as_str().map(str::len), Some(section.len()));
    }

    #[test]
    fn command_translator_rejects_failure_and_empty_output() {
        let failing = shell("cat >/dev/null; echo boom >&2; exit 2");
        let err = failing.translate_new("## A\n", None).unwrap_err();
        assert!(err.message.contains("boom"));

        let silent = shell("cat >/dev/null");
        assert!(silent.translate_new("## A\n", None).is_err());
    }
}
