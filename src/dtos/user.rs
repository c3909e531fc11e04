//! User DTOs - Data Transfer Objects per utenti e autenticazione

use crate::entities::{User, UserRole};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

lazy_static! {
    /// Nessun carattere di controllo né markup nei nomi visualizzati
    pub static ref FULL_NAME_REGEX: Regex = Regex::new(r"^[^<>\x00-\x1F]+$").unwrap();
}

/// I nomi vengono salvati senza spazi esterni: uno fatto di soli spazi resterebbe vuoto
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Must not be blank".into());
        return Err(error);
    }
    Ok(())
}

// struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserDTO {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub is_onboarded: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        // la password non viene mai esposta al client
        Self {
            id: value.user_id,
            full_name: value.full_name,
            email: value.email,
            role: value.role,
            bio: value.bio,
            profile_pic: value.profile_pic,
            is_onboarded: value.is_onboarded,
            created_at: value.created_at,
        }
    }
}

/// DTO per creare un nuovo utente (password già hashata)
#[derive(Debug, Clone)]
pub struct CreateUserDTO {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Body di POST /auth/signup; il ruolo resta stringa per rispondere 400 sui valori fuori enum
#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupDTO {
    #[validate(
        length(min = 1, max = 100, message = "Full name must be between 1 and 100 characters"),
        regex(path = *FULL_NAME_REGEX, message = "Full name contains invalid characters"),
        custom(function = "validate_not_blank")
    )]
    pub full_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub role: String,

    #[validate(email(message = "Invalid child email format"))]
    pub child_email: Option<String>,
}

/// Body di POST /auth/login
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginDTO {
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponseDTO {
    pub success: bool,
    pub user: UserDTO,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Aggiornamento profilo (onboarding): nome obbligatorio, bio e foto modificate solo se presenti
#[derive(Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileDTO {
    #[validate(
        length(min = 1, max = 100, message = "Full name must be between 1 and 100 characters"),
        regex(path = *FULL_NAME_REGEX, message = "Full name contains invalid characters"),
        custom(function = "validate_not_blank")
    )]
    pub full_name: String,

    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,

    #[validate(url(message = "Profile picture must be a valid URL"))]
    pub profile_pic: Option<String>,
}

#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LinkChildDTO {
    #[validate(email(message = "Invalid child email format"))]
    pub child_email: String,
}
