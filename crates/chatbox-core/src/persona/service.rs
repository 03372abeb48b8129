//! Persona management service.
//!
//! CRUD over personas with uniqueness and referential checks layered on top
//! of the repository.

use chatbox_types::error::{PersonaError, RepositoryError};
use chatbox_types::persona::{Persona, PersonaDraft, PersonaPatch};
use tracing::info;

use crate::persona::repository::PersonaRepository;

/// Service for creating, reading, updating and deleting personas.
pub struct PersonaService<R: PersonaRepository> {
    repo: R,
}

impl<R: PersonaRepository> PersonaService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Access the persona repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Create a persona. Fails with `Conflict` if the role name is taken.
    pub async fn create(&self, draft: PersonaDraft) -> Result<Persona, PersonaError> {
        validate_required(&[
            ("role_name", &draft.role_name),
            ("goal", &draft.goal),
            ("personality", &draft.personality),
            ("setting", &draft.setting),
        ])?;

        let persona = self
            .repo
            .create(&draft)
            .await
            .map_err(|e| map_write_error(e, &draft.role_name))?;

        info!(persona_id = persona.id, role_name = %persona.role_name, "persona created");
        Ok(persona)
    }

    /// All personas, ordered by role name.
    pub async fn list(&self) -> Result<Vec<Persona>, PersonaError> {
        self.repo
            .list()
            .await
            .map_err(|e| PersonaError::StorageError(e.to_string()))
    }

    pub async fn get(&self, id: i64) -> Result<Persona, PersonaError> {
        self.repo
            .get(id)
            .await
            .map_err(|e| PersonaError::StorageError(e.to_string()))?
            .ok_or(PersonaError::NotFound)
    }

    /// Apply a partial update. Only the fields present in `patch` change.
    pub async fn update(&self, id: i64, patch: PersonaPatch) -> Result<Persona, PersonaError> {
        let mut persona = self.get(id).await?;
        patch.apply_to(&mut persona);

        validate_required(&[
            ("role_name", &persona.role_name),
            ("goal", &persona.goal),
            ("personality", &persona.personality),
            ("setting", &persona.setting),
        ])?;

        self.repo
            .update(&persona)
            .await
            .map_err(|e| map_write_error(e, &persona.role_name))?;

        info!(persona_id = id, "persona updated");
        Ok(persona)
    }

    /// Delete a persona. Refused with `InUse` while any session refers to it.
    pub async fn delete(&self, id: i64) -> Result<(), PersonaError> {
        let references = self
            .repo
            .count_sessions(id)
            .await
            .map_err(|e| PersonaError::StorageError(e.to_string()))?;
        if references > 0 {
            return Err(PersonaError::InUse(references));
        }

        let deleted = self.repo.delete(id).await.map_err(|e| match e {
            // A session started referencing the persona after the count.
            RepositoryError::Conflict(_) => PersonaError::InUse(1),
            other => PersonaError::StorageError(other.to_string()),
        })?;
        if !deleted {
            return Err(PersonaError::NotFound);
        }

        info!(persona_id = id, "persona deleted");
        Ok(())
    }
}

fn validate_required(fields: &[(&str, &String)]) -> Result<(), PersonaError> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(PersonaError::Invalid(format!("{name} must not be empty")));
        }
    }
    Ok(())
}

fn map_write_error(err: RepositoryError, role_name: &str) -> PersonaError {
    match err {
        RepositoryError::Conflict(_) => PersonaError::Conflict(role_name.to_string()),
        RepositoryError::NotFound => PersonaError::NotFound,
        other => PersonaError::StorageError(other.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory persona store with a per-persona session reference count.
    #[derive(Default)]
    pub(crate) struct MemoryPersonaRepo {
        pub personas: Mutex<BTreeMap<i64, Persona>>,
        pub references: Mutex<BTreeMap<i64, u64>>,
    }

    impl MemoryPersonaRepo {
        fn name_taken(map: &BTreeMap<i64, Persona>, name: &str, except: Option<i64>) -> bool {
            map.values()
                .any(|p| p.role_name == name && Some(p.id) != except)
        }
    }

    impl PersonaRepository for MemoryPersonaRepo {
        async fn create(&self, draft: &PersonaDraft) -> Result<Persona, RepositoryError> {
            let mut map = self.personas.lock().unwrap();
            if Self::name_taken(&map, &draft.role_name, None) {
                return Err(RepositoryError::Conflict("role_name".to_string()));
            }
            let id = map.keys().next_back().copied().unwrap_or(0) + 1;
            let persona = Persona {
                id,
                role_name: draft.role_name.clone(),
                avatar_url: draft.avatar_url.clone(),
                default_language: draft.default_language.clone(),
                goal: draft.goal.clone(),
                personality: draft.personality.clone(),
                tone_of_voice: draft.tone_of_voice.clone(),
                expertise: draft.expertise.clone(),
                setting: draft.setting.clone(),
                situation: draft.situation.clone(),
                must_do_rules: draft.must_do_rules.clone(),
                must_not_do_rules: draft.must_not_do_rules.clone(),
                response_length: draft.response_length.clone(),
                response_format: draft.response_format.clone(),
                starting_instruction: draft.starting_instruction.clone(),
                additional_notes: draft.additional_notes.clone(),
                voice_id: draft.voice_id.clone(),
                created_at: Utc::now(),
            };
            map.insert(id, persona.clone());
            Ok(persona)
        }

        async fn get(&self, id: i64) -> Result<Option<Persona>, RepositoryError> {
            Ok(self.personas.lock().unwrap().get(&id).cloned())
        }

        async fn list(&self) -> Result<Vec<Persona>, RepositoryError> {
            let mut all: Vec<Persona> = self.personas.lock().unwrap().values().cloned().collect();
            all.sort_by(|a, b| a.role_name.cmp(&b.role_name));
            Ok(all)
        }

        async fn update(&self, persona: &Persona) -> Result<(), RepositoryError> {
            let mut map = self.personas.lock().unwrap();
            if !map.contains_key(&persona.id) {
                return Err(RepositoryError::NotFound);
            }
            if Self::name_taken(&map, &persona.role_name, Some(persona.id)) {
                return Err(RepositoryError::Conflict("role_name".to_string()));
            }
            map.insert(persona.id, persona.clone());
            Ok(())
        }

        async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
            Ok(self.personas.lock().unwrap().remove(&id).is_some())
        }

        async fn count_sessions(&self, id: i64) -> Result<u64, RepositoryError> {
            Ok(self.references.lock().unwrap().get(&id).copied().unwrap_or(0))
        }
    }

    pub(crate) fn draft(role_name: &str) -> PersonaDraft {
        PersonaDraft {
            role_name: role_name.to_string(),
            avatar_url: None,
            default_language: Some("English".to_string()),
            goal: "Help the user practice ordering food".to_string(),
            personality: "Patient".to_string(),
            tone_of_voice: None,
            expertise: None,
            setting: "A diner".to_string(),
            situation: None,
            must_do_rules: None,
            must_not_do_rules: None,
            response_length: None,
            response_format: None,
            starting_instruction: None,
            additional_notes: None,
            voice_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = PersonaService::new(MemoryPersonaRepo::default());
        let created = service.create(draft("Waiter")).await.unwrap();
        let fetched = service.get(created.id).await.unwrap();
        assert_eq!(fetched.role_name, "Waiter");
    }

    #[tokio::test]
    async fn test_duplicate_role_name_conflicts() {
        let service = PersonaService::new(MemoryPersonaRepo::default());
        service.create(draft("Waiter")).await.unwrap();
        let err = service.create(draft("Waiter")).await.unwrap_err();
        assert!(matches!(err, PersonaError::Conflict(name) if name == "Waiter"));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_required_field() {
        let service = PersonaService::new(MemoryPersonaRepo::default());
        let mut bad = draft("Waiter");
        bad.goal = "  ".to_string();
        let err = service.create(bad).await.unwrap_err();
        assert!(matches!(err, PersonaError::Invalid(msg) if msg.contains("goal")));
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_role_name() {
        let service = PersonaService::new(MemoryPersonaRepo::default());
        for name in ["Zookeeper", "Astronaut", "Mechanic"] {
            service.create(draft(name)).await.unwrap();
        }
        let names: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.role_name)
            .collect();
        assert_eq!(names, ["Astronaut", "Mechanic", "Zookeeper"]);
    }

    #[tokio::test]
    async fn test_update_patches_fields() {
        let service = PersonaService::new(MemoryPersonaRepo::default());
        let created = service.create(draft("Waiter")).await.unwrap();

        let updated = service
            .update(
                created.id,
                PersonaPatch {
                    voice_id: Some("Matthew".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.voice_id.as_deref(), Some("Matthew"));
        assert_eq!(updated.goal, created.goal);
        assert_eq!(service.get(created.id).await.unwrap().voice_id, updated.voice_id);
    }

    #[tokio::test]
    async fn test_update_missing_persona() {
        let service = PersonaService::new(MemoryPersonaRepo::default());
        let err = service.update(99, PersonaPatch::default()).await.unwrap_err();
        assert!(matches!(err, PersonaError::NotFound));
    }

    #[tokio::test]
    async fn test_update_to_taken_name_conflicts() {
        let service = PersonaService::new(MemoryPersonaRepo::default());
        service.create(draft("Waiter")).await.unwrap();
        let chef = service.create(draft("Chef")).await.unwrap();

        let err = service
            .update(
                chef.id,
                PersonaPatch {
                    role_name: Some("Waiter".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PersonaError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_refused_while_referenced() {
        let repo = MemoryPersonaRepo::default();
        let service = PersonaService::new(repo);
        let created = service.create(draft("Waiter")).await.unwrap();
        service
            .repo()
            .references
            .lock()
            .unwrap()
            .insert(created.id, 2);

        let err = service.delete(created.id).await.unwrap_err();
        assert!(matches!(err, PersonaError::InUse(2)));
        assert!(service.get(created.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_then_missing() {
        let service = PersonaService::new(MemoryPersonaRepo::default());
        let created = service.create(draft("Waiter")).await.unwrap();

        service.delete(created.id).await.unwrap();

        assert!(matches!(
            service.delete(created.id).await,
            Err(PersonaError::NotFound)
        ));
        assert!(matches!(
            service.get(created.id).await,
            Err(PersonaError::NotFound)
        ));
    }
}
