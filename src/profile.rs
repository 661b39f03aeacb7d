use crate::app_dirs::AppDirs;
use crate::error::ProfileError;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Stored participant identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            created_at: Utc::now(),
        }
    }
}

/// Random `XXXX-XXXX-XXXX-XXXX` id of uppercase hex digits
pub fn generate_participant_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut id = String::with_capacity(19);
    for group in 0..4 {
        if group > 0 {
            id.push('-');
        }
        for _ in 0..4 {
            id.push(HEX[rng.gen_range(0..HEX.len())] as char);
        }
    }
    id
}

pub fn is_valid_participant_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Uses the typed id when one was given, otherwise generates a fresh one.
pub fn resolve_participant_id<R: Rng + ?Sized>(
    input: &str,
    rng: &mut R,
) -> Result<String, ProfileError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        let id = generate_participant_id(rng);
        info!(user_id = %id, "generated participant id");
        return Ok(id);
    }
    if !is_valid_participant_id(trimmed) {
        return Err(ProfileError::InvalidId(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::profile_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<Option<Profile>, ProfileError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, profile: &Profile) -> Result<(), ProfileError> {
        if !is_valid_participant_id(&profile.user_id) {
            return Err(ProfileError::InvalidId(profile.user_id.clone()));
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(profile)?)?;
        Ok(())
    }

    /// Returns the stored profile, creating one with a generated id if absent.
    pub fn load_or_create<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Profile, ProfileError> {
        if let Some(profile) = self.load()? {
            return Ok(profile);
        }
        let profile = Profile::new(generate_participant_id(rng));
        self.save(&profile)?;
        Ok(profile)
    }
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    #[test]
    fn generated_id_has_four_hex_groups() {
        let mut rng = StdRng::seed_from_u64(8);
        let id = generate_participant_id(&mut rng);
        assert_eq!(id.len(), 19);
        let groups: Vec<&str> = id.split('-').collect();
        assert_eq!(groups.len(), 4);
        for g in groups {
            assert_eq!(g.len(), 4);
            assert!(g.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        }
    }

    #[test]
    fn blank_input_generates_an_id() {
        let mut rng = StdRng::seed_from_u64(1);
        let id = resolve_participant_id("   ", &mut rng).unwrap();
        assert!(is_valid_participant_id(&id));
        assert_eq!(id.len(), 19);
    }

    #[test]
    fn typed_id_is_trimmed_and_kept() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(resolve_participant_id("  p-042 \n", &mut rng).unwrap(), "p-042");
    }

    #[test]
    fn invalid_characters_are_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_matches!(
            resolve_participant_id("bad id!", &mut rng),
            Err(ProfileError::InvalidId(id)) if id == "bad id!"
        );
    }

    #[test]
    fn store_roundtrip_and_load_or_create() {
        let dir = tempdir().unwrap();
        let store = ProfileStore::with_path(dir.path().join("profile.json"));
        assert!(store.load().unwrap().is_none());

        let mut rng = StdRng::seed_from_u64(5);
        let created = store.load_or_create(&mut rng).unwrap();
        let again = store.load_or_create(&mut rng).unwrap();
        assert_eq!(created, again);

        let custom = Profile::new("SUBJ-01".into());
        store.save(&custom).unwrap();
        assert_eq!(store.load().unwrap(), Some(custom));
    }
}
