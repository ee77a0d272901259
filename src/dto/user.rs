use crate::domain;
use crate::domain::user::Country;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for creating or overwriting a user via the API
#[derive(Deserialize, Display, Validate, ToSchema)]
#[display("{username} <{email}>")]
#[cfg_attr(test, derive(Serialize))]
pub struct UserInput {
    #[validate(length(min = 3, max = 100))]
    #[schema(example = "jdoe")]
    pub username: String,
    #[validate(email)]
    #[schema(example = "jdoe@example.com")]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub country: Option<Country>,
}

impl From<&UserInput> for domain::user::UserContent {
    fn from(value: &UserInput) -> Self {
        domain::user::UserContent {
            username: value.username.clone(),
            email: value.email.clone(),
            password: value.password.clone(),
            country: value.country,
        }
    }
}

/// DTO for a user returned by the API. Never carries password material.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct UserOutput {
    #[schema(example = 4)]
    pub id: i64,
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "jdoe@example.com")]
    pub email: String,
    pub country: Option<Country>,
}

impl From<domain::user::UserView> for UserOutput {
    fn from(value: domain::user::UserView) -> Self {
        UserOutput {
            id: value.id,
            username: value.username,
            email: value.email,
            country: value.country,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod user_input {
        use super::*;

        #[test]
        fn bad_user_data_gets_rejected() {
            let bad_user = UserInput {
                username: "jd".to_owned(),
                email: "not-an-email".to_owned(),
                password: "short".to_owned(),
                country: None,
            };
            let validation_result = bad_user.validate();
            assert!(validation_result.is_err());
            let validation_errors = validation_result.unwrap_err();
            let field_validations = validation_errors.field_errors();
            assert!(field_validations.contains_key("username"));
            assert!(field_validations.contains_key("email"));
            assert!(field_validations.contains_key("password"));
        }

        #[test]
        fn good_user_data_passes() {
            let good_user = UserInput {
                username: "jdoe".to_owned(),
                email: "jdoe@example.com".to_owned(),
                password: "hunter42".to_owned(),
                country: Some(Country::Ireland),
            };
            assert!(good_user.validate().is_ok());
        }
    }
}
