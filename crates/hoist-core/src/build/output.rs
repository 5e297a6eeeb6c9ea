//! Parsing of the compiler's structured build output.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use super::ArtifactDescriptor;
use crate::error::{Error, Result};
use crate::types::ObjectId;

#[derive(Deserialize)]
struct RawBuildOutput {
    modules: Vec<String>,
    #[serde(default)]
    dependencies: Vec<String>,
    digest: Vec<u8>,
}

fn malformed(reason: impl std::fmt::Display) -> Error {
    Error::BuildFailed {
        diagnostics: format!("compiler output is not a valid build summary: {reason}"),
    }
}

/// Parse `{modules: [base64], dependencies: [id], digest: [u8]}`.
///
/// Compilers may print progress lines on stdout ahead of the JSON
/// document; the first line opening a JSON object starts the document.
pub fn parse_build_output(stdout: &str) -> Result<ArtifactDescriptor> {
    let document = stdout
        .find("\n{")
        .map(|pos| &stdout[pos + 1..])
        .filter(|_| !stdout.trim_start().starts_with('{'))
        .unwrap_or(stdout)
        .trim();
    if document.is_empty() {
        return Err(malformed("no output"));
    }

    let raw: RawBuildOutput = serde_json::from_str(document).map_err(malformed)?;
    if raw.modules.is_empty() {
        return Err(malformed("no modules"));
    }
    if raw.digest.is_empty() {
        return Err(malformed("empty digest"));
    }

    let modules = raw
        .modules
        .iter()
        .enumerate()
        .map(|(i, module)| {
            BASE64
                .decode(module)
                .map_err(|e| malformed(format!("module {i} is not base64: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut dependencies: Vec<ObjectId> = Vec::with_capacity(raw.dependencies.len());
    for literal in &raw.dependencies {
        let id: ObjectId = literal
            .parse()
            .map_err(|e| malformed(format!("dependency {literal}: {e}")))?;
        if !dependencies.contains(&id) {
            dependencies.push(id);
        }
    }

    Ok(ArtifactDescriptor::new(modules, dependencies, raw.digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    #[test]
    fn parses_summary_document() {
        let stdout = r#"{"modules":["oRzrCwY=","AQI="],"dependencies":["0x1","0x2","0x0002"],"digest":[1,2,3]}"#;
        let artifact = parse_build_output(stdout).unwrap();
        assert_eq!(artifact.modules().len(), 2);
        assert_eq!(artifact.modules()[1], vec![1u8, 2]);
        assert_eq!(
            artifact.dependencies(),
            &[Address::from_short(1), Address::from_short(2)]
        );
        assert_eq!(artifact.digest(), &[1u8, 2, 3]);
    }

    #[test]
    fn skips_leading_progress_lines() {
        let stdout = "INCLUDING DEPENDENCY Sui\nBUILDING arca\n{\"modules\":[\"AQI=\"],\"dependencies\":[],\"digest\":[9]}\n";
        let artifact = parse_build_output(stdout).unwrap();
        assert_eq!(artifact.modules(), &[vec![1u8, 2]]);
    }

    #[test]
    fn rejects_wrong_shapes() {
        for bad in [
            "",
            "not json",
            r#"{"modules":[],"dependencies":[],"digest":[1]}"#,
            r#"{"modules":["AQI="],"dependencies":[],"digest":[]}"#,
            r#"{"modules":["***"],"dependencies":[],"digest":[1]}"#,
            r#"{"modules":["AQI="],"dependencies":["0xnothex"],"digest":[1]}"#,
        ] {
            let err = parse_build_output(bad).unwrap_err();
            assert!(matches!(err, Error::BuildFailed { .. }), "input: {bad}");
        }
    }
}
