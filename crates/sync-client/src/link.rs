//! Share links of the form `<base>/?game=<id>`.

use chess_core::GameId;
use url::Url;

use crate::error::ClientError;

pub const GAME_PARAM: &str = "game";

/// Game id carried by a link's query string, if any.
pub fn game_id_from_link(link: &str) -> Result<Option<GameId>, ClientError> {
    let url = Url::parse(link)?;
    match url.query_pairs().find(|(key, _)| key == GAME_PARAM) {
        Some((_, value)) => Ok(Some(GameId::parse(&value)?)),
        None => Ok(None),
    }
}

/// Link another player can open to join `id`.
pub fn share_link(base: &Url, id: &GameId) -> Url {
    let mut url = base.clone();
    url.set_path("/");
    url.query_pairs_mut()
        .clear()
        .append_pair(GAME_PARAM, id.as_str());
    url
}
