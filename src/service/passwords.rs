use crate::error::CmsError;
use crate::service::tokens::random_token;
use tokio::sync::OnceCell;

/// bcrypt is CPU bound; hashing runs on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> Result<String, CmsError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| CmsError::Internal(format!("password hashing aborted: {e}")))?
        .map_err(CmsError::from)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, CmsError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| CmsError::Internal(format!("password check aborted: {e}")))?
        .map_err(CmsError::from)
}

/// Login password check that costs the same bcrypt work whether or not the
/// account exists. Unknown emails are verified against a decoy hash built
/// once at the configured cost.
pub struct LoginVerifier {
    cost: u32,
    decoy: OnceCell<String>,
}

impl LoginVerifier {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            decoy: OnceCell::new(),
        }
    }

    /// `stored` is the account's hash, `None` for an unknown email.
    pub async fn verify(&self, password: String, stored: Option<String>) -> Result<bool, CmsError> {
        match stored {
            Some(hash) => verify_password(password, hash).await,
            None => {
                let decoy = self.decoy_hash().await?;
                verify_password(password, decoy).await?;
                Ok(false)
            }
        }
    }

    /// Build the decoy ahead of the first failed login.
    pub async fn prime(&self) -> Result<(), CmsError> {
        self.decoy_hash().await.map(drop)
    }

    async fn decoy_hash(&self) -> Result<String, CmsError> {
        let hash = self
            .decoy
            .get_or_try_init(|| hash_password(random_token(), self.cost))
            .await?;
        Ok(hash.clone())
    }
}
