use crate::domain::crud::{EntityMapper, ForeignKeyRef, HasForeignKeys};
use crate::security::password;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// The EU member states a user may declare as their country of residence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Country {
    Austria,
    Belgium,
    Bulgaria,
    Croatia,
    Cyprus,
    CzechRepublic,
    Denmark,
    Estonia,
    Finland,
    France,
    Germany,
    Greece,
    Hungary,
    Ireland,
    Italy,
    Latvia,
    Lithuania,
    Luxembourg,
    Malta,
    Netherlands,
    Poland,
    Portugal,
    Romania,
    Slovakia,
    Slovenia,
    Spain,
    Sweden,
}

impl Country {
    /// The stable identifier stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Austria => "AUSTRIA",
            Country::Belgium => "BELGIUM",
            Country::Bulgaria => "BULGARIA",
            Country::Croatia => "CROATIA",
            Country::Cyprus => "CYPRUS",
            Country::CzechRepublic => "CZECH_REPUBLIC",
            Country::Denmark => "DENMARK",
            Country::Estonia => "ESTONIA",
            Country::Finland => "FINLAND",
            Country::France => "FRANCE",
            Country::Germany => "GERMANY",
            Country::Greece => "GREECE",
            Country::Hungary => "HUNGARY",
            Country::Ireland => "IRELAND",
            Country::Italy => "ITALY",
            Country::Latvia => "LATVIA",
            Country::Lithuania => "LITHUANIA",
            Country::Luxembourg => "LUXEMBOURG",
            Country::Malta => "MALTA",
            Country::Netherlands => "NETHERLANDS",
            Country::Poland => "POLAND",
            Country::Portugal => "PORTUGAL",
            Country::Romania => "ROMANIA",
            Country::Slovakia => "SLOVAKIA",
            Country::Slovenia => "SLOVENIA",
            Country::Spain => "SPAIN",
            Country::Sweden => "SWEDEN",
        }
    }
}

impl FromStr for Country {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let country = match raw {
            "AUSTRIA" => Country::Austria,
            "BELGIUM" => Country::Belgium,
            "BULGARIA" => Country::Bulgaria,
            "CROATIA" => Country::Croatia,
            "CYPRUS" => Country::Cyprus,
            "CZECH_REPUBLIC" => Country::CzechRepublic,
            "DENMARK" => Country::Denmark,
            "ESTONIA" => Country::Estonia,
            "FINLAND" => Country::Finland,
            "FRANCE" => Country::France,
            "GERMANY" => Country::Germany,
            "GREECE" => Country::Greece,
            "HUNGARY" => Country::Hungary,
            "IRELAND" => Country::Ireland,
            "ITALY" => Country::Italy,
            "LATVIA" => Country::Latvia,
            "LITHUANIA" => Country::Lithuania,
            "LUXEMBOURG" => Country::Luxembourg,
            "MALTA" => Country::Malta,
            "NETHERLANDS" => Country::Netherlands,
            "POLAND" => Country::Poland,
            "PORTUGAL" => Country::Portugal,
            "ROMANIA" => Country::Romania,
            "SLOVAKIA" => Country::Slovakia,
            "SLOVENIA" => Country::Slovenia,
            "SPAIN" => Country::Spain,
            "SWEDEN" => Country::Sweden,
            other => return Err(anyhow::anyhow!("unrecognized country \"{other}\"")),
        };

        Ok(country)
    }
}

/// A registered user as it exists in storage. The password only exists here in hashed
/// form, plaintext never crosses the domain boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub country: Option<Country>,
}

impl HasForeignKeys for AppUser {
    fn foreign_keys(&self) -> Vec<ForeignKeyRef> {
        Vec::new()
    }
}

/// The caller-controlled fields of a user, used for both create and overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContent {
    pub username: String,
    pub email: String,
    pub password: String,
    pub country: Option<Country>,
}

/// What the outside world may see of a user. Notably excludes the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub country: Option<Country>,
}

/// Converts user inputs into storable entities, hashing the incoming password on the way
/// in. The ID on a mapped entity is a placeholder until the store assigns a real one.
pub struct UserMapper;

impl EntityMapper for UserMapper {
    type Entity = AppUser;
    type Input = UserContent;
    type Output = UserView;

    fn to_entity(&self, input: &UserContent) -> Result<AppUser, anyhow::Error> {
        let password_hash =
            password::hash_password(&input.password).context("hashing a user's password")?;

        Ok(AppUser {
            id: 0,
            username: input.username.clone(),
            email: input.email.clone(),
            password_hash,
            country: input.country,
        })
    }

    fn to_output(&self, entity: AppUser) -> UserView {
        UserView {
            id: entity.id,
            username: entity.username,
            email: entity.email,
            country: entity.country,
        }
    }
}

#[cfg(test)]
pub mod test_util {
    use super::*;
    use crate::domain::crud::driven_ports::{EntityStore, RelationDetect};
    use crate::domain::crud::{Relation, UpdateOutcome};
    use crate::domain::search::{FieldTable, Page, PageRequest, Specification};
    use crate::external_connections::ExternalConnectivity;
    use std::collections::HashMap;
    use std::sync::RwLock;

    pub fn user_with_id(id: i64, username: &str) -> AppUser {
        AppUser {
            id,
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            password_hash: "$argon2id$fakehash".to_owned(),
            country: Some(Country::France),
        }
    }

    /// In-memory user store tracking entities by ID.
    pub struct InMemoryUserStore {
        pub users: RwLock<HashMap<i64, AppUser>>,
        pub next_id: RwLock<i64>,
    }

    impl InMemoryUserStore {
        pub fn new() -> InMemoryUserStore {
            InMemoryUserStore {
                users: RwLock::new(HashMap::new()),
                next_id: RwLock::new(1),
            }
        }

        pub fn with_users(users: impl IntoIterator<Item = AppUser>) -> InMemoryUserStore {
            let store = InMemoryUserStore::new();
            {
                let mut user_map = store.users.write().unwrap();
                let mut next_id = store.next_id.write().unwrap();
                for user in users {
                    *next_id = (*next_id).max(user.id + 1);
                    user_map.insert(user.id, user);
                }
            }
            store
        }
    }

    impl EntityStore for InMemoryUserStore {
        type Entity = AppUser;

        const SEARCH_FIELDS: FieldTable = &[
            ("id", "id"),
            ("username", "username"),
            ("email", "email"),
            ("country", "country"),
        ];

        async fn find_by_id(
            &self,
            id: i64,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<AppUser>, anyhow::Error> {
            Ok(self.users.read().unwrap().get(&id).cloned())
        }

        async fn find_all(
            &self,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<AppUser>, anyhow::Error> {
            let mut all: Vec<AppUser> = self.users.read().unwrap().values().cloned().collect();
            all.sort_by_key(|user| user.id);
            Ok(all)
        }

        async fn insert(
            &self,
            entity: &AppUser,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<AppUser, anyhow::Error> {
            let mut next_id = self.next_id.write().unwrap();
            let stored = AppUser {
                id: *next_id,
                ..entity.clone()
            };
            *next_id += 1;
            self.users.write().unwrap().insert(stored.id, stored.clone());
            Ok(stored)
        }

        async fn update(
            &self,
            id: i64,
            entity: &AppUser,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<UpdateOutcome<AppUser>, anyhow::Error> {
            let mut users = self.users.write().unwrap();
            if !users.contains_key(&id) {
                return Ok(UpdateOutcome::Missing);
            }
            let stored = AppUser {
                id,
                ..entity.clone()
            };
            users.insert(id, stored.clone());
            Ok(UpdateOutcome::Updated(stored))
        }

        async fn delete(
            &self,
            id: i64,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error> {
            self.users.write().unwrap().remove(&id);
            Ok(())
        }

        async fn search(
            &self,
            _spec: &Specification,
            page: PageRequest,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Page<AppUser>, anyhow::Error> {
            let all = self.find_all(ext_cxn).await?;
            let total = all.len() as i64;
            let items = all
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.size as usize)
                .collect();
            Ok(Page {
                items,
                total,
                page: page.page,
                size: page.size,
            })
        }
    }

    /// Relation detector backed by a fixed set of known IDs per relation.
    pub struct StaticRelationDetect {
        pub existing: Vec<(Relation, i64)>,
    }

    impl RelationDetect for StaticRelationDetect {
        async fn relation_exists(
            &self,
            relation: Relation,
            id: i64,
            _ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error> {
            Ok(self
                .existing
                .iter()
                .any(|(known_relation, known_id)| *known_relation == relation && *known_id == id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;
    use crate::domain::crud::{CrudError, CrudService};
    use crate::external_connections::test_util::FakeExternalConnectivity;
    use speculoos::prelude::*;
    use std::str::FromStr;

    fn service() -> CrudService<UserMapper> {
        CrudService::new(UserMapper)
    }

    fn no_relations() -> StaticRelationDetect {
        StaticRelationDetect { existing: vec![] }
    }

    #[tokio::test]
    async fn create_hashes_password_and_assigns_id() {
        let mut ext_cxn = FakeExternalConnectivity::new();
        let store = InMemoryUserStore::new();
        let input = UserContent {
            username: "jdoe".to_owned(),
            email: "jdoe@example.com".to_owned(),
            password: "hunter42".to_owned(),
            country: Some(Country::Germany),
        };

        let created = service()
            .create(&input, &mut ext_cxn, &store, &no_relations())
            .await
            .expect("create should succeed");

        assert_eq!(1, created.id);
        assert_eq!("jdoe", created.username);

        let stored = store.users.read().unwrap().get(&1).cloned().unwrap();
        assert_that!(stored.password_hash).starts_with("$argon2id$");
        assert_ne!("hunter42", stored.password_hash);
    }

    #[tokio::test]
    async fn get_by_id_returns_none_for_missing_user() {
        let mut ext_cxn = FakeExternalConnectivity::new();
        let store = InMemoryUserStore::new();

        let fetched = service()
            .get_by_id(42, &mut ext_cxn, &store)
            .await
            .expect("lookup should succeed");

        assert_that!(fetched).is_none();
    }

    #[tokio::test]
    async fn update_of_missing_user_is_not_found() {
        let mut ext_cxn = FakeExternalConnectivity::new();
        let store = InMemoryUserStore::new();
        let input = UserContent {
            username: "ghost".to_owned(),
            email: "ghost@example.com".to_owned(),
            password: "hunter42".to_owned(),
            country: None,
        };

        let result = service()
            .update(99, &input, &mut ext_cxn, &store, &no_relations())
            .await;

        assert!(matches!(result, Err(CrudError::NotFound)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let mut ext_cxn = FakeExternalConnectivity::new();
        let store = InMemoryUserStore::with_users([user_with_id(1, "jdoe")]);

        service()
            .delete(1, &mut ext_cxn, &store)
            .await
            .expect("first delete should succeed");
        service()
            .delete(1, &mut ext_cxn, &store)
            .await
            .expect("second delete should also succeed");

        assert!(store.users.read().unwrap().is_empty());
    }

    #[test]
    fn country_round_trips_through_storage_form() {
        assert_eq!(
            Country::CzechRepublic,
            Country::from_str(Country::CzechRepublic.as_str()).unwrap()
        );
        assert!(Country::from_str("ATLANTIS").is_err());
    }
}
