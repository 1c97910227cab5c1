//! Application state for the chat server

use std::sync::Arc;

use crate::chatbot::Chatbot;
use crate::config::ChatbotConfig;
use crate::error::Result;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: ChatbotConfig,
    /// The chatbot service
    chatbot: Chatbot,
}

impl AppState {
    /// Create new application state
    pub async fn new(config: ChatbotConfig) -> Result<Self> {
        let chatbot = Chatbot::new(&config).await?;
        Ok(Self::from_chatbot(chatbot, config))
    }

    /// Wrap an already-built chatbot
    pub(crate) fn from_chatbot(chatbot: Chatbot, config: ChatbotConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, chatbot }),
        }
    }

    /// Get the chatbot
    pub fn chatbot(&self) -> &Chatbot {
        &self.inner.chatbot
    }

    /// Get configuration
    pub fn config(&self) -> &ChatbotConfig {
        &self.inner.config
    }
}
