// src/store/members.rs

use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::AppError;
use crate::models::user::{Credential, Member};
use crate::store::{load_or_init, persist};

#[derive(Debug)]
pub enum RegisterOutcome {
    Registered(Member),
    /// Another credential already holds this username (case-insensitive).
    DuplicateUsername,
}

/// Profile fields supplied at registration; the store assigns the ID.
#[derive(Debug)]
pub struct NewMember {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub profile_image: String,
    pub is_administrator: bool,
    pub zip_code: Option<String>,
    pub description: Option<String>,
}

/// The JSON-backed credential list and member directory.
///
/// Two documents, one lock each. The username-uniqueness check and the
/// credential append share the credentials critical section, so two
/// concurrent registrations of the same name cannot both pass the check.
/// No invariant spans both files, so they are not locked together.
pub struct MemberStore {
    credentials_file: PathBuf,
    members_file: PathBuf,
    credentials: Mutex<Vec<Credential>>,
    members: Mutex<Vec<Member>>,
}

impl MemberStore {
    pub fn open(credentials_file: PathBuf, members_file: PathBuf) -> Result<Self, AppError> {
        let credentials = load_or_init(&credentials_file)?;
        let members = load_or_init(&members_file)?;
        Ok(Self {
            credentials_file,
            members_file,
            credentials: Mutex::new(credentials),
            members: Mutex::new(members),
        })
    }

    fn lock_credentials(&self) -> std::sync::MutexGuard<'_, Vec<Credential>> {
        self.credentials.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_members(&self) -> std::sync::MutexGuard<'_, Vec<Member>> {
        self.members.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a credential and its member profile.
    ///
    /// Member IDs are `max(existing) + 1` rather than `len() + 1`; the
    /// latter would hand out a duplicate after any future deletion.
    pub fn register(
        &self,
        credential: Credential,
        profile: NewMember,
    ) -> Result<RegisterOutcome, AppError> {
        let username = credential.username.clone();
        {
            let mut credentials = self.lock_credentials();
            if credentials
                .iter()
                .any(|c| c.username.eq_ignore_ascii_case(&username))
            {
                return Ok(RegisterOutcome::DuplicateUsername);
            }
            credentials.push(credential);
            persist(&self.credentials_file, &credentials)?;
        }

        let mut members = self.lock_members();
        let id = members.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        let member = Member {
            id,
            name: profile.name,
            phone: profile.phone,
            email: profile.email,
            username,
            profile_image: profile.profile_image,
            is_administrator: profile.is_administrator,
            zip_code: profile.zip_code,
            description: profile.description,
        };
        members.push(member.clone());
        persist(&self.members_file, &members)?;
        Ok(RegisterOutcome::Registered(member))
    }

    /// Case-insensitive linear scan, first match.
    pub fn find_credential(&self, username: &str) -> Option<Credential> {
        self.lock_credentials()
            .iter()
            .find(|c| c.username.eq_ignore_ascii_case(username))
            .cloned()
    }

    pub fn find_member(&self, username: &str) -> Option<Member> {
        self.lock_members()
            .iter()
            .find(|m| m.username.eq_ignore_ascii_case(username))
            .cloned()
    }

    /// Full profile list for the members directory.
    pub fn members(&self) -> Vec<Member> {
        self.lock_members().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store() -> (TempDir, MemberStore) {
        let dir = TempDir::new().unwrap();
        let store = MemberStore::open(
            dir.path().join("credentials.json"),
            dir.path().join("members.json"),
        )
        .unwrap();
        (dir, store)
    }

    fn credential(username: &str) -> Credential {
        Credential {
            username: username.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            email: format!("{username}@example.com"),
            description: None,
            zip_code: None,
            created_at: Utc::now(),
        }
    }

    fn profile(name: &str) -> NewMember {
        NewMember {
            name: name.to_string(),
            phone: "555-0100".to_string(),
            email: format!("{name}@example.com"),
            profile_image: "Avatar1.jpg".to_string(),
            is_administrator: false,
            zip_code: None,
            description: None,
        }
    }

    #[test]
    fn username_uniqueness_ignores_case() {
        let (_dir, store) = store();
        assert!(matches!(
            store.register(credential("Alice"), profile("Alice")).unwrap(),
            RegisterOutcome::Registered(_)
        ));
        assert!(matches!(
            store.register(credential("alice"), profile("Other")).unwrap(),
            RegisterOutcome::DuplicateUsername
        ));
        assert!(store.find_credential("ALICE").is_some());
        assert_eq!(store.members().len(), 1);
    }

    #[test]
    fn concurrent_registration_of_same_name_admits_one() {
        let (_dir, store) = store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.register(credential("race"), profile("Race")).unwrap()
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|o| matches!(o, RegisterOutcome::Registered(_)))
            .count();

        assert_eq!(wins, 1);
        assert_eq!(store.members().len(), 1);
    }

    #[test]
    fn member_ids_are_monotonic_and_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let cf = dir.path().join("credentials.json");
        let mf = dir.path().join("members.json");
        {
            let store = MemberStore::open(cf.clone(), mf.clone()).unwrap();
            store.register(credential("alice"), profile("Alice")).unwrap();
            store.register(credential("bob"), profile("Bob")).unwrap();
        }

        let store = MemberStore::open(cf, mf).unwrap();
        let ids: Vec<u64> = store.members().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);

        match store.register(credential("carol"), profile("Carol")).unwrap() {
            RegisterOutcome::Registered(m) => assert_eq!(m.id, 3),
            other => panic!("expected registration, got {:?}", other),
        }
    }
}
