use crate::client::{ApiRequest, CustomGptClient};
use crate::error::ApiResult;
use crate::models::{UsageLimits, User};

impl CustomGptClient {
    /// The user owning the configured API key.
    pub async fn user(&self) -> ApiResult<User> {
        self.call(ApiRequest::get("/user")).await
    }

    pub async fn usage_limits(&self) -> ApiResult<UsageLimits> {
        self.call(ApiRequest::get("/limits/usage")).await
    }
}
