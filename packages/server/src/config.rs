use crate::store::StoreError;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Files kept in process memory
    Memory,
    /// Files committed to a GitHub repository
    Github,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Server configuration from flags, falling back to environment variables
#[derive(Debug, Clone, Parser)]
#[command(name = "pagesmith-server", version, about = "Pagesmith content API")]
pub struct ServerConfig {
    #[arg(long, env = "PAGESMITH_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, env = "PAGESMITH_PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = "PAGESMITH_STORE", value_enum, default_value_t = StoreKind::Memory)]
    pub store: StoreKind,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    #[arg(long, env = "GITHUB_OWNER")]
    pub github_owner: Option<String>,

    #[arg(long, env = "GITHUB_REPO")]
    pub github_repo: Option<String>,

    #[arg(long, env = "GITHUB_BRANCH", default_value = "main")]
    pub github_branch: String,

    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub github_api_url: String,

    /// Path of the page template inside the store
    #[arg(long, env = "PAGESMITH_HTML_PATH", default_value = "index.html")]
    pub html_path: String,

    /// Path of the content document inside the store
    #[arg(long, env = "PAGESMITH_CONTENT_PATH", default_value = "content.json")]
    pub content_path: String,

    /// Directory holding the initial files for the memory store
    #[arg(long, env = "PAGESMITH_SEED_DIR")]
    pub seed_dir: Option<PathBuf>,

    #[arg(long, env = "PAGESMITH_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,

    #[arg(long, env = "PAGESMITH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Everything needed to talk to the GitHub contents API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubSettings {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub api_url: String,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// GitHub settings, or a misconfiguration naming every missing variable
    pub fn github_settings(&self) -> Result<GitHubSettings, StoreError> {
        let present = |value: &Option<String>| value.as_ref().filter(|v| !v.trim().is_empty()).cloned();
        let token = present(&self.github_token);
        let owner = present(&self.github_owner);
        let repo = present(&self.github_repo);

        match (token, owner, repo) {
            (Some(token), Some(owner), Some(repo)) => Ok(GitHubSettings {
                token,
                owner,
                repo,
                branch: self.github_branch.clone(),
                api_url: self.github_api_url.trim_end_matches('/').to_string(),
            }),
            (token, owner, repo) => {
                let missing: Vec<&str> = [
                    ("GITHUB_TOKEN", token.is_none()),
                    ("GITHUB_OWNER", owner.is_none()),
                    ("GITHUB_REPO", repo.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, missing)| missing.then_some(name))
                .collect();
                Err(StoreError::Misconfigured(format!(
                    "missing {}",
                    missing.join(", ")
                )))
            }
        }
    }
}
