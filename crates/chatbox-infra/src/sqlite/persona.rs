//! SQLite persona repository implementation.
//!
//! Implements `PersonaRepository` from `chatbox-core` using sqlx with split
//! read/write pools: raw queries, a private Row struct, RFC 3339 timestamps.

use chatbox_core::persona::repository::PersonaRepository;
use chatbox_types::error::RepositoryError;
use chatbox_types::persona::{Persona, PersonaDraft};
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `PersonaRepository`.
#[derive(Clone)]
pub struct SqlitePersonaRepository {
    pool: DatabasePool,
}

impl SqlitePersonaRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Persona.
struct PersonaRow {
    id: i64,
    role_name: String,
    avatar_url: Option<String>,
    default_language: Option<String>,
    goal: String,
    personality: String,
    tone_of_voice: Option<String>,
    expertise: Option<String>,
    setting: String,
    situation: Option<String>,
    must_do_rules: Option<String>,
    must_not_do_rules: Option<String>,
    response_length: Option<String>,
    response_format: Option<String>,
    starting_instruction: Option<String>,
    additional_notes: Option<String>,
    voice_id: Option<String>,
    created_at: String,
}

impl PersonaRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            role_name: row.try_get("role_name")?,
            avatar_url: row.try_get("avatar_url")?,
            default_language: row.try_get("default_language")?,
            goal: row.try_get("goal")?,
            personality: row.try_get("personality")?,
            tone_of_voice: row.try_get("tone_of_voice")?,
            expertise: row.try_get("expertise")?,
            setting: row.try_get("setting")?,
            situation: row.try_get("situation")?,
            must_do_rules: row.try_get("must_do_rules")?,
            must_not_do_rules: row.try_get("must_not_do_rules")?,
            response_length: row.try_get("response_length")?,
            response_format: row.try_get("response_format")?,
            starting_instruction: row.try_get("starting_instruction")?,
            additional_notes: row.try_get("additional_notes")?,
            voice_id: row.try_get("voice_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_persona(self) -> Result<Persona, RepositoryError> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))?;

        Ok(Persona {
            id: self.id,
            role_name: self.role_name,
            avatar_url: self.avatar_url,
            default_language: self.default_language,
            goal: self.goal,
            personality: self.personality,
            tone_of_voice: self.tone_of_voice,
            expertise: self.expertise,
            setting: self.setting,
            situation: self.situation,
            must_do_rules: self.must_do_rules,
            must_not_do_rules: self.must_not_do_rules,
            response_length: self.response_length,
            response_format: self.response_format,
            starting_instruction: self.starting_instruction,
            additional_notes: self.additional_notes,
            voice_id: self.voice_id,
            created_at,
        })
    }
}

fn map_write_error(e: sqlx::Error, role_name: &str) -> RepositoryError {
    match e {
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE") => {
            RepositoryError::Conflict(format!("persona '{role_name}' already exists"))
        }
        other => RepositoryError::Query(other.to_string()),
    }
}

impl PersonaRepository for SqlitePersonaRepository {
    async fn create(&self, draft: &PersonaDraft) -> Result<Persona, RepositoryError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO personas (role_name, avatar_url, default_language, goal, personality,
                   tone_of_voice, expertise, setting, situation, must_do_rules, must_not_do_rules,
                   response_length, response_format, starting_instruction, additional_notes,
                   voice_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&draft.role_name)
        .bind(&draft.avatar_url)
        .bind(&draft.default_language)
        .bind(&draft.goal)
        .bind(&draft.personality)
        .bind(&draft.tone_of_voice)
        .bind(&draft.expertise)
        .bind(&draft.setting)
        .bind(&draft.situation)
        .bind(&draft.must_do_rules)
        .bind(&draft.must_not_do_rules)
        .bind(&draft.response_length)
        .bind(&draft.response_format)
        .bind(&draft.starting_instruction)
        .bind(&draft.additional_notes)
        .bind(&draft.voice_id)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| map_write_error(e, &draft.role_name))?;

        Ok(Persona {
            id: result.last_insert_rowid(),
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
            created_at,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Persona>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM personas WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let persona_row =
                    PersonaRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(persona_row.into_persona()?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Persona>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM personas ORDER BY role_name ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                PersonaRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_persona()
            })
            .collect()
    }

    async fn update(&self, persona: &Persona) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE personas
               SET role_name = ?, avatar_url = ?, default_language = ?, goal = ?, personality = ?,
                   tone_of_voice = ?, expertise = ?, setting = ?, situation = ?, must_do_rules = ?,
                   must_not_do_rules = ?, response_length = ?, response_format = ?,
                   starting_instruction = ?, additional_notes = ?, voice_id = ?
               WHERE id = ?"#,
        )
        .bind(&persona.role_name)
        .bind(&persona.avatar_url)
        .bind(&persona.default_language)
        .bind(&persona.goal)
        .bind(&persona.personality)
        .bind(&persona.tone_of_voice)
        .bind(&persona.expertise)
        .bind(&persona.setting)
        .bind(&persona.situation)
        .bind(&persona.must_do_rules)
        .bind(&persona.must_not_do_rules)
        .bind(&persona.response_length)
        .bind(&persona.response_format)
        .bind(&persona.starting_instruction)
        .bind(&persona.additional_notes)
        .bind(&persona.voice_id)
        .bind(persona.id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| map_write_error(e, &persona.role_name))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM personas WHERE id = ?")
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err) if db_err.message().contains("FOREIGN KEY") => {
                    RepositoryError::Conflict(format!("persona {id} is referenced by sessions"))
                }
                other => RepositoryError::Query(other.to_string()),
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_sessions(&self, id: i64) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_sessions WHERE persona_id = ?")
            .bind(id)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(count as u64)
    }
}
