use std::env;
use std::path::PathBuf;

use dcms_schedule::Actor;

#[derive(Clone, Debug)]
pub struct Config {
    pub appointments_path: PathBuf,
    pub settings_path: Option<PathBuf>,
    pub actor_role: String,
    pub actor_id: Option<String>,
    pub actor_name: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let appointments_path = PathBuf::from(env::var("APPOINTMENTS_PATH")?);
        let settings_path = env::var("SETTINGS_PATH").ok().map(PathBuf::from);
        let actor_role = env::var("ACTOR_ROLE").unwrap_or_else(|_| "receptionist".to_string());
        let actor_id = env::var("ACTOR_ID").ok().filter(|s| !s.trim().is_empty());
        let actor_name = env::var("ACTOR_NAME").ok().filter(|s| !s.trim().is_empty());

        Ok(Self {
            appointments_path,
            settings_path,
            actor_role,
            actor_id,
            actor_name,
        })
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.actor_id.clone(),
            name: self.actor_name.clone(),
            ..Actor::new(&self.actor_role)
        }
    }
}
