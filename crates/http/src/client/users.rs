//! User profile client methods

use super::{ExpenseClient, RequestOptions, error::ClientError};
use crate::types::{UpdateUserRequest, User};

impl ExpenseClient {
    /// Get the signed-in user's profile
    pub async fn get_me(&self) -> Result<User, ClientError> {
        self.get("/users/me", RequestOptions::default()).await
    }

    /// Update the signed-in user's profile
    pub async fn update_me(&self, update: &UpdateUserRequest) -> Result<User, ClientError> {
        self.patch("/users/me", Some(update), RequestOptions::default())
            .await
    }
}
