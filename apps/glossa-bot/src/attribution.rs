use glossa_shared::api::UtmParams;
use tracing::warn;

/// Hard platform limit on a deep-link start parameter.
pub const MAX_START_PARAM_LEN: usize = 64;

/// UTM + promo attribution decoded from a deep-link start payload, or
/// assembled before composing an outbound link. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribution {
    pub utm: UtmParams,
    pub promo_id: Option<String>,
}

impl Attribution {
    /// Parses a raw start payload. Supports both full UTM keys
    /// (`utm_source`) and the compact aliases (`us`) used to fit the
    /// 64-character ceiling. Never fails: malformed input degrades to an
    /// empty attribution, losing the tags is better than losing the user.
    pub fn decode(raw: &str) -> Self {
        let mut attribution = Self::default();
        if raw.trim().is_empty() {
            return attribution;
        }

        let decoded = match urlencoding::decode(raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Malformed start payload {:?}, dropping attribution: {}", raw, e);
                return attribution;
            }
        };

        for pair in decoded.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }

            match key {
                "us" | "utm_source" => attribution.utm.utm_source = Some(value.to_string()),
                "um" | "utm_medium" => attribution.utm.utm_medium = Some(value.to_string()),
                "uc" | "utm_campaign" => attribution.utm.utm_campaign = Some(value.to_string()),
                "ut" | "utm_term" => attribution.utm.utm_term = Some(value.to_string()),
                "ucn" | "utm_content" => attribution.utm.utm_content = Some(value.to_string()),
                "promo" | "promo_id" => attribution.promo_id = Some(value.to_string()),
                _ => {}
            }
        }

        attribution
    }

    /// Emits the compact token: present fields only, fixed order (source,
    /// medium, campaign, term, content, promo), values percent-encoded.
    /// A token over [`MAX_START_PARAM_LEN`] is still produced, the
    /// platform may reject or truncate it, so the overflow is surfaced as
    /// a warning.
    pub fn encode(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let fields = [
            ("us", &self.utm.utm_source),
            ("um", &self.utm.utm_medium),
            ("uc", &self.utm.utm_campaign),
            ("ut", &self.utm.utm_term),
            ("ucn", &self.utm.utm_content),
        ];

        let mut params = Vec::new();
        for (key, value) in fields {
            if let Some(value) = value {
                params.push(format!("{}={}", key, urlencoding::encode(value)));
            }
        }
        if let Some(promo) = &self.promo_id {
            params.push(format!("promo={}", urlencoding::encode(promo)));
        }

        let token = params.join("&");
        if token.len() > MAX_START_PARAM_LEN {
            warn!(
                "Start parameter exceeds {} chars ({}), the platform may reject it: {}",
                MAX_START_PARAM_LEN,
                token.len(),
                token
            );
        }
        token
    }

    pub fn is_empty(&self) -> bool {
        self.utm.is_empty() && self.promo_id.is_none()
    }

    /// Gates the attributed startapp button. Term or content alone are not
    /// worth a rich deep link.
    pub fn has_actionable_attribution(&self) -> bool {
        self.utm.utm_source.is_some()
            || self.utm.utm_campaign.is_some()
            || self.utm.utm_medium.is_some()
    }
}

/// Deep link opening the Mini App with an attribution token, or the bare
/// bot profile when there is nothing to carry. The bot identifier is not
/// validated here, that is the caller's responsibility.
pub fn deep_link(bot_username: &str, token: &str) -> String {
    if token.is_empty() {
        return format!("https://t.me/{bot_username}");
    }
    format!(
        "https://t.me/{}?startapp={}",
        bot_username,
        urlencoding::encode(token)
    )
}
