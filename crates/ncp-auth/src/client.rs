use aws_sdk_cognitoidentityprovider::Client;

/// A Cognito client bound to one user pool and app client.
#[derive(Debug, Clone)]
pub struct Cognito {
    pub client: Client,
    pub user_pool_id: String,
    pub client_id: String,
}

impl Cognito {
    pub fn new(client: Client, user_pool_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            client,
            user_pool_id: user_pool_id.into(),
            client_id: client_id.into(),
        }
    }

    /// Build from the default AWS config, optionally pinning a region.
    pub async fn connect(region: Option<&str>, user_pool_id: &str, client_id: &str) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }
        let config = loader.load().await;
        Self::new(Client::new(&config), user_pool_id, client_id)
    }

    /// Region encoded in the pool id (`us-east-1_AbC123` → `us-east-1`).
    pub fn region(&self) -> Option<&str> {
        self.user_pool_id.split_once('_').map(|(region, _)| region)
    }
}
