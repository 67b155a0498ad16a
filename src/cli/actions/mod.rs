pub mod server;
pub mod token;

// The match lives in `run` so this module stays small as actions are added.
mod run;

#[derive(Debug)]
pub enum Action {
    Server(server::Args),
    Token(token::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
