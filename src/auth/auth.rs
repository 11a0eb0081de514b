use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::models::{Claims, TokenType};
use actix_web::{dev::Payload, error::ErrorUnauthorized, web::Data, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, DecodingKey, Validation};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )))
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        // Refresh tokens open no doors besides /auth/refresh and /auth/logout.
        if data.claims.token_type != TokenType::Access {
            return ready(Err(ErrorUnauthorized("Invalid token")));
        }

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            email: data.claims.sub,
            role: data.claims.role,
        }))
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Teachers and admins may issue codes and manage classrooms.
    pub fn require_teacher_or_admin(&self) -> Result<(), ApiError> {
        if matches!(self.role, Role::Teacher | Role::Admin) {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "Only teachers and admins can perform this action",
            ))
        }
    }

    pub fn require_teacher(&self) -> Result<(), ApiError> {
        if self.role == Role::Teacher {
            Ok(())
        } else {
            Err(ApiError::forbidden("Only teachers can perform this action"))
        }
    }

    /// Only students mark attendance, upload selfies or raise requests.
    pub fn require_student(&self) -> Result<(), ApiError> {
        if self.role == Role::Student {
            Ok(())
        } else {
            Err(ApiError::forbidden("Only students can perform this action"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            email: "x@school.edu".into(),
            role,
        }
    }

    #[test]
    fn teacher_or_admin_guard() {
        assert!(user(Role::Teacher).require_teacher_or_admin().is_ok());
        assert!(user(Role::Admin).require_teacher_or_admin().is_ok());
        assert!(user(Role::Student).require_teacher_or_admin().is_err());
    }

    #[test]
    fn student_guard() {
        assert!(user(Role::Student).require_student().is_ok());
        assert!(user(Role::Teacher).require_student().is_err());
        assert!(user(Role::Admin).require_student().is_err());
    }

    #[test]
    fn teacher_only_guard() {
        assert!(user(Role::Teacher).require_teacher().is_ok());
        assert!(user(Role::Admin).require_teacher().is_err());
    }
}
