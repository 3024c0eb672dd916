use crate::{
    auth::{password, AuthService, IssuedToken},
    config::BootstrapAdmin,
    db::DbPool,
    entities::user::{
        self, AccountStatus, ActiveModel as UserActiveModel, Entity as UserEntity, Role,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{read_error, write_error};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateOperatorRequest {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 7, max = 20, message = "phone must be 7 to 20 characters"))]
    pub phone: String,
    /// Falls back to the configured initial password
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateOperatorRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SetStatusRequest {
    pub status: AccountStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub old_password: String,
    #[validate(length(min = 8, message = "new password must be at least 8 characters"))]
    pub new_password: String,
}

/// Account as shown to admins; never includes the password hash
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OperatorResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for OperatorResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            role: model.role,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_blocking(plain: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| {
            ServiceError::Other(anyhow::Error::new(e).context("password hashing task failed"))
        })?
}

async fn verify_blocking(plain: String, hash: String) -> Result<bool, ServiceError> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| {
            ServiceError::Other(anyhow::Error::new(e).context("password hashing task failed"))
        })?
}

/// Accounts, login and the admin bootstrap
#[derive(Clone)]
pub struct OperatorService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    auth: Arc<AuthService>,
    default_password: String,
}

impl OperatorService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        auth: Arc<AuthService>,
        default_password: String,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            auth,
            default_password,
        }
    }

    async fn find_user(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        UserEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| read_error(e, "user"))?
            .ok_or_else(|| ServiceError::NotFound(format!("Operator {} not found", id)))
    }

    /// Rejects values already used by another account
    async fn ensure_unique(
        &self,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        if name.is_none() && email.is_none() && phone.is_none() {
            return Ok(());
        }

        let mut any = Condition::any();
        if let Some(name) = name {
            any = any.add(user::Column::Name.eq(name));
        }
        if let Some(email) = email {
            any = any.add(user::Column::Email.eq(email));
        }
        if let Some(phone) = phone {
            any = any.add(user::Column::Phone.eq(phone));
        }

        let mut query = UserEntity::find().filter(any);
        if let Some(id) = except {
            query = query.filter(user::Column::Id.ne(id));
        }

        if let Some(clash) = query
            .one(&*self.db_pool)
            .await
            .map_err(|e| read_error(e, "user"))?
        {
            let field = if name == Some(clash.name.as_str()) {
                "name"
            } else if email == Some(clash.email.as_str()) {
                "email"
            } else {
                "phone"
            };
            return Err(ServiceError::Conflict(format!(
                "An account with this {} already exists",
                field
            )));
        }
        Ok(())
    }

    async fn insert_account(
        &self,
        name: String,
        email: String,
        phone: String,
        plain_password: String,
        role: Role,
    ) -> Result<user::Model, ServiceError> {
        self.ensure_unique(Some(&name), Some(&email), Some(&phone), None)
            .await?;
        let password_hash = hash_blocking(plain_password).await?;

        UserActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            email: Set(email),
            phone: Set(phone),
            password_hash: Set(password_hash),
            role: Set(role),
            status: Set(AccountStatus::Active),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| write_error(e, "account"))
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_operator(
        &self,
        request: CreateOperatorRequest,
    ) -> Result<OperatorResponse, ServiceError> {
        request.validate()?;
        let password = request
            .password
            .unwrap_or_else(|| self.default_password.clone());

        let model = self
            .insert_account(
                request.name.trim().to_string(),
                normalize_email(&request.email),
                request.phone.trim().to_string(),
                password,
                Role::Operator,
            )
            .await?;

        info!(user_id = %model.id, "Operator created");
        self.event_sender
            .send_or_log(Event::OperatorCreated {
                user_id: model.id,
                email: model.email.clone(),
            })
            .await;

        Ok(model.into())
    }

    /// Every non-admin account
    #[instrument(skip(self))]
    pub async fn list_operators(&self) -> Result<Vec<OperatorResponse>, ServiceError> {
        Ok(UserEntity::find()
            .filter(user::Column::Role.ne(Role::Admin))
            .order_by_asc(user::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(|e| read_error(e, "user"))?
            .into_iter()
            .map(OperatorResponse::from)
            .collect())
    }

    #[instrument(skip(self, request))]
    pub async fn update_operator(
        &self,
        id: Uuid,
        request: UpdateOperatorRequest,
    ) -> Result<OperatorResponse, ServiceError> {
        if request.name.is_none() && request.phone.is_none() && request.password.is_none() {
            return Err(ServiceError::ValidationError(
                "no fields to update".to_string(),
            ));
        }
        request.validate()?;

        let existing = self.find_user(id).await?;
        if existing.role != Role::Operator {
            return Err(ServiceError::Forbidden(
                "only operator accounts can be edited".to_string(),
            ));
        }

        let name = request.name.map(|n| n.trim().to_string());
        let phone = request.phone.map(|p| p.trim().to_string());
        self.ensure_unique(name.as_deref(), None, phone.as_deref(), Some(id))
            .await?;

        let mut active: UserActiveModel = existing.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(phone) = phone {
            active.phone = Set(phone);
        }
        if let Some(password) = request.password {
            active.password_hash = Set(hash_blocking(password).await?);
        }

        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(|e| write_error(e, "account"))?;
        info!(user_id = %id, "Operator updated");
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: Uuid,
        status: AccountStatus,
    ) -> Result<OperatorResponse, ServiceError> {
        let existing = self.find_user(id).await?;
        if existing.role == Role::Admin {
            return Err(ServiceError::Forbidden(
                "admin accounts cannot be deactivated".to_string(),
            ));
        }

        let mut active: UserActiveModel = existing.into();
        active.status = Set(status);
        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(|e| write_error(e, "account"))?;

        info!(user_id = %id, %status, "Operator status changed");
        Ok(updated.into())
    }

    #[instrument(skip(self, request))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<(), ServiceError> {
        request.validate()?;
        let existing = self.find_user(user_id).await?;

        if !verify_blocking(request.old_password, existing.password_hash.clone()).await? {
            return Err(ServiceError::ValidationError(
                "current password is incorrect".to_string(),
            ));
        }

        let mut active: UserActiveModel = existing.into();
        active.password_hash = Set(hash_blocking(request.new_password).await?);
        active
            .update(&*self.db_pool)
            .await
            .map_err(|e| write_error(e, "account"))?;

        info!(%user_id, "Password changed");
        Ok(())
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<IssuedToken, ServiceError> {
        request.validate()?;
        let invalid = || ServiceError::Unauthorized("invalid email or password".to_string());

        let account = UserEntity::find()
            .filter(user::Column::Email.eq(normalize_email(&request.email)))
            .one(&*self.db_pool)
            .await
            .map_err(|e| read_error(e, "user"))?
            .ok_or_else(invalid)?;

        if !verify_blocking(request.password, account.password_hash.clone()).await? {
            warn!(user_id = %account.id, "Failed login attempt");
            return Err(invalid());
        }
        if !account.is_active() {
            return Err(ServiceError::Unauthorized(
                "account is deactivated".to_string(),
            ));
        }

        let token = self.auth.generate_token(&account)?;
        info!(user_id = %account.id, role = %account.role, "Login succeeded");
        Ok(token)
    }

    /// Creates the first admin when none exists. Returns the new account, or
    /// `None` if an admin was already present.
    #[instrument(skip(self, admin), fields(email = %admin.email))]
    pub async fn ensure_admin(
        &self,
        admin: BootstrapAdmin,
    ) -> Result<Option<OperatorResponse>, ServiceError> {
        let existing = UserEntity::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .one(&*self.db_pool)
            .await
            .map_err(|e| read_error(e, "user"))?;

        if existing.is_some() {
            return Ok(None);
        }

        let model = self
            .insert_account(
                admin.name,
                normalize_email(&admin.email),
                admin.phone,
                admin.password,
                Role::Admin,
            )
            .await?;
        info!(user_id = %model.id, "Bootstrap admin created");
        Ok(Some(model.into()))
    }

    /// Whether any admin account exists
    pub async fn has_admin(&self) -> Result<bool, ServiceError> {
        Ok(UserEntity::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .one(&*self.db_pool)
            .await
            .map_err(|e| read_error(e, "user"))?
            .is_some())
    }
}
