use anyhow::{bail, Context};

pub const MAPBOX_TOKEN_VAR: &str = "MAPBOX_TOKEN";

#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
    pub style: &'static str,
}

impl MapSettings {
    pub fn with_token(access_token: &str) -> anyhow::Result<Self> {
        if access_token.trim().is_empty() {
            bail!("{MAPBOX_TOKEN_VAR} is set but empty");
        }

        Ok(Self {
            center_lat: -42.88,
            center_lon: 147.329,
            zoom: 14.0,
            style: "dark",
        })
    }

    /// Map rendering cannot start without a tile access token.
    pub fn from_env() -> anyhow::Result<Self> {
        let token = std::env::var(MAPBOX_TOKEN_VAR)
            .with_context(|| format!("{MAPBOX_TOKEN_VAR} must be set to render map charts"))?;
        Self::with_token(&token)
    }
}
