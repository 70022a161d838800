//! Account flows driven through the input-request protocol.

use std::sync::Arc;

use tokio::sync::watch;

use storefront_backend::{
    BlobStore, DocumentStore, IdentityProvider, Query, StoreContext,
};
use storefront_cart::{UserRecord, profile_fields};
use storefront_core::{StoreError, StoreResult};

use crate::notice::Notifier;
use crate::prompt::{InputField, Prompter};
use crate::watcher::AuthView;

const CREATE_CANCELLED: &str = "Cancelled: username, email and password are required.";

/// New profile picture: an existing URL or bytes to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileImage {
    Url(String),
    Upload { file_name: String, bytes: Vec<u8> },
}

/// Blob path of an uploaded profile picture: `{prefix}/{uid}/{millis}_{file_name}`.
pub fn profile_upload_path(prefix: &str, uid: &str, millis: i64, file_name: &str) -> String {
    let name: String = file_name
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{}/{uid}/{millis}_{name}", prefix.trim_end_matches('/'))
}

pub struct AccountFlows {
    ctx: StoreContext,
    prompter: Prompter,
    notifier: Notifier,
    state: Arc<watch::Sender<AuthView>>,
}

impl core::fmt::Debug for AccountFlows {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountFlows").finish_non_exhaustive()
    }
}

impl AccountFlows {
    pub fn new(
        ctx: StoreContext,
        prompter: Prompter,
        notifier: Notifier,
        state: Arc<watch::Sender<AuthView>>,
    ) -> Self {
        Self {
            ctx,
            prompter,
            notifier,
            state,
        }
    }

    /// Sign up and write the full user record. The new account is signed in right away.
    pub async fn create_account(&self) -> StoreResult<()> {
        let answer = self
            .prompter
            .ask(
                "Create account",
                vec![
                    InputField::text("username", "Username"),
                    InputField::text("email", "Email"),
                    InputField::secret("password", "Password (min 6 chars)"),
                    InputField::text("pet", "Pet name (recovery)"),
                ],
            )
            .await;
        let (Some(username), Some(email), Some(password)) = (
            answer.value("username"),
            answer.value("email"),
            answer.raw("password"),
        ) else {
            self.notifier.info(CREATE_CANCELLED);
            return Ok(());
        };

        let identity = self
            .ctx
            .identity
            .create_account(email, password)
            .await
            .map_err(StoreError::from)?;

        let mut record = UserRecord::minimal(identity.user_id.clone(), identity.email.clone());
        record.username = username.to_string();
        record.pet = answer.value("pet").map(str::to_string);
        self.ctx
            .documents
            .set(
                &self.ctx.config.users_collection,
                identity.user_id.as_str(),
                record.account_fields(),
                false,
            )
            .await
            .map_err(|err| {
                tracing::error!(user_id = %identity.user_id, error = %err, "failed to write new user record");
                StoreError::from(err)
            })?;

        tracing::info!(user_id = %identity.user_id, "account created");
        self.notifier
            .info("Account created successfully. You are now signed in.");
        Ok(())
    }

    /// Cancelling the prompt is a no-op.
    pub async fn sign_in(&self) -> StoreResult<()> {
        let answer = self
            .prompter
            .ask(
                "Sign in",
                vec![
                    InputField::text("email", "Email"),
                    InputField::secret("password", "Password"),
                ],
            )
            .await;
        let (Some(email), Some(password)) = (answer.value("email"), answer.raw("password"))
        else {
            return Ok(());
        };

        self.ctx
            .identity
            .sign_in(email, password)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    pub async fn sign_out(&self) -> StoreResult<()> {
        self.ctx.identity.sign_out().await.map_err(StoreError::from)?;
        self.notifier.info("Signed out.");
        Ok(())
    }

    /// Send a reset e-mail once the user proves they know the account's recovery phrase.
    pub async fn recover_password(&self) -> StoreResult<()> {
        let answer = self
            .prompter
            .ask(
                "Password recovery",
                vec![InputField::text("email", "Account email")],
            )
            .await;
        let Some(email) = answer.value("email") else {
            return Ok(());
        };

        let query = Query::new().where_eq("email", email);
        let found = self
            .ctx
            .documents
            .query(&self.ctx.config.users_collection, &query)
            .await
            .map_err(StoreError::from)?;
        let Some(doc) = found.into_iter().next() else {
            self.notifier.error("No account found for that email.");
            return Ok(());
        };
        let record = UserRecord::decode(&doc.id, doc.data)?;

        let phrase = self
            .prompter
            .ask(
                "Password recovery",
                vec![InputField::text("pet", "Pet name (recovery)")],
            )
            .await;
        let expected = record.pet.as_deref().unwrap_or_default();
        match phrase.value("pet") {
            Some(given) if given == expected => {
                self.ctx
                    .identity
                    .send_password_reset(email)
                    .await
                    .map_err(StoreError::from)?;
                tracing::info!(user_id = %record.uid, "password reset e-mail requested");
                self.notifier
                    .info("Password reset email sent. Check your inbox.");
            }
            _ => {
                tracing::warn!(user_id = %record.uid, "recovery phrase mismatch");
                self.notifier
                    .error("Recovery phrase did not match. Cannot reset via this method.");
            }
        }
        Ok(())
    }

    /// Point the signed-in user's avatar at a URL or a freshly uploaded picture.
    pub async fn change_profile_image(&self, image: ProfileImage) -> StoreResult<String> {
        let user = self
            .state
            .borrow()
            .user
            .clone()
            .ok_or(StoreError::NotSignedIn)?;
        let uid = user.identity.user_id;

        let url = match image {
            ProfileImage::Url(url) => {
                let url = url.trim().to_string();
                if url.is_empty() {
                    return Err(StoreError::validation("image URL cannot be empty"));
                }
                url
            }
            ProfileImage::Upload { file_name, bytes } => {
                if file_name.trim().is_empty() {
                    return Err(StoreError::validation("file name cannot be empty"));
                }
                let path = profile_upload_path(
                    &self.ctx.config.profile_upload_prefix,
                    uid.as_str(),
                    chrono::Utc::now().timestamp_millis(),
                    &file_name,
                );
                let blob = self
                    .ctx
                    .blobs
                    .upload(&path, bytes)
                    .await
                    .map_err(StoreError::from)?;
                self.ctx
                    .blobs
                    .get_url(&blob)
                    .await
                    .map_err(StoreError::from)?
            }
        };

        self.ctx
            .documents
            .set(
                &self.ctx.config.users_collection,
                uid.as_str(),
                profile_fields(&url),
                true,
            )
            .await
            .map_err(|err| {
                tracing::error!(user_id = %uid, error = %err, "failed to save profile image");
                StoreError::from(err)
            })?;

        self.state.send_modify(|view| {
            if let Some(current) = view.user.as_mut().filter(|u| u.identity.user_id == uid) {
                current.record.profile = url.clone();
            }
        });
        tracing::info!(user_id = %uid, "profile image updated");
        self.notifier.info("Profile updated.");
        Ok(url)
    }
}
