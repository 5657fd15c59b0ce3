//! Credential file loading.
//!
//! Two shapes are accepted: a plain text file with one account per line, or
//! a JSON array. Text lines are `name:secret`, `name:secret:seed`, or
//! `name:secret:path.maFile`, the last pulling the authenticator seed out
//! of a desktop-authenticator export. `#` starts a comment.

use account_client::Credential;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Deserialize)]
struct CredentialRecord {
    identifier: String,
    secret: String,
    #[serde(default)]
    two_factor_seed: Option<String>,
}

/// Authenticator export; only the seed matters here.
#[derive(Debug, Deserialize)]
struct AuthenticatorExport {
    shared_secret: String,
}

/// Load the roster from `path`, dropping duplicate identifiers with a
/// warning. The engine trusts its input to be unique, so uniqueness is
/// enforced here.
pub fn load_credentials(path: &Path) -> Result<Vec<Credential>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("could not read accounts file {}", path.display()))?;
    let trimmed = content.trim();

    let mut credentials = if trimmed.starts_with('[') {
        parse_json(trimmed)?
    } else {
        parse_lines(trimmed, path)
    };
    dedupe(&mut credentials);

    if credentials.is_empty() {
        bail!("no usable accounts in {}", path.display());
    }
    Ok(credentials)
}

fn parse_json(content: &str) -> Result<Vec<Credential>> {
    let records: Vec<CredentialRecord> =
        serde_json::from_str(content).context("accounts file is not a valid JSON array")?;
    Ok(records
        .into_iter()
        .map(|r| {
            let mut credential = Credential::new(r.identifier, r.secret);
            if let Some(seed) = r.two_factor_seed.filter(|s| !s.is_empty()) {
                credential = credential.with_seed(seed);
            }
            credential
        })
        .collect())
}

fn parse_lines(content: &str, accounts_path: &Path) -> Vec<Credential> {
    let mut credentials = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.splitn(3, ':');
        let (Some(identifier), Some(secret)) = (parts.next(), parts.next()) else {
            warn!(line = line_num + 1, "skipping malformed account line");
            continue;
        };
        if identifier.is_empty() || secret.is_empty() {
            warn!(line = line_num + 1, "skipping account line with empty fields");
            continue;
        }

        let mut credential = Credential::new(identifier, secret);
        if let Some(extra) = parts.next().map(str::trim).filter(|s| !s.is_empty()) {
            let seed = if extra.ends_with(".maFile") {
                load_seed_from_export(extra, accounts_path, line_num + 1)
            } else {
                Some(extra.to_string())
            };
            if let Some(seed) = seed {
                credential = credential.with_seed(seed);
            }
        }
        credentials.push(credential);
    }
    credentials
}

/// Resolve and read an authenticator export named on an account line.
/// Relative paths are tried in the conventional spots before giving up;
/// a miss means the account simply runs without a second factor.
fn load_seed_from_export(reference: &str, accounts_path: &Path, line_num: usize) -> Option<String> {
    let reference_path = Path::new(reference);
    let resolved = if reference_path.is_absolute() {
        reference_path.exists().then(|| reference_path.to_path_buf())
    } else {
        export_candidates(reference, accounts_path)
            .into_iter()
            .find(|p| p.exists())
    };

    let Some(path) = resolved else {
        warn!(line = line_num, reference, "authenticator export not found");
        return None;
    };

    match fs::read_to_string(&path)
        .map_err(anyhow::Error::from)
        .and_then(|raw| serde_json::from_str::<AuthenticatorExport>(&raw).map_err(Into::into))
    {
        Ok(export) if !export.shared_secret.is_empty() => Some(export.shared_secret),
        Ok(_) => {
            warn!(line = line_num, path = %path.display(), "export has an empty shared_secret");
            None
        }
        Err(e) => {
            warn!(line = line_num, path = %path.display(), error = %e, "unreadable authenticator export");
            None
        }
    }
}

fn export_candidates(reference: &str, accounts_path: &Path) -> Vec<PathBuf> {
    let accounts_dir = accounts_path.parent().unwrap_or_else(|| Path::new("."));
    vec![
        PathBuf::from(reference),
        Path::new("mafiles").join(reference),
        accounts_dir.join("..").join("mafiles").join(reference),
        accounts_dir.join(reference),
    ]
}

fn dedupe(credentials: &mut Vec<Credential>) {
    let mut seen = HashSet::new();
    credentials.retain(|c| {
        let fresh = seen.insert(c.identifier.clone());
        if !fresh {
            warn!(identifier = %c.identifier, "duplicate account dropped");
        }
        fresh
    });
}
