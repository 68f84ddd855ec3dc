use super::request::{
    AuthorityRevocation, ImageFile, SocialLinks, SubmissionRequest, SubmissionRequestParams,
    ValidationError, MAX_DECIMALS,
};

const DEFAULT_DECIMALS: &str = "9";

/// Raw, unvalidated form state as typed by the user.
#[derive(Debug, Clone)]
pub struct SubmissionForm {
    pub name: String,
    pub symbol: String,
    pub initial_supply: String,
    pub decimals: String,
    pub description: String,
    pub image: Option<ImageFile>,
    pub socials_enabled: bool,
    pub socials: SocialLinks,
    pub revoke_mint_authority: bool,
    pub revoke_freeze_authority: bool,
}

impl Default for SubmissionForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            symbol: String::new(),
            initial_supply: String::new(),
            decimals: DEFAULT_DECIMALS.to_owned(),
            description: String::new(),
            image: None,
            socials_enabled: false,
            socials: SocialLinks::default(),
            revoke_mint_authority: false,
            revoke_freeze_authority: false,
        }
    }
}

impl SubmissionForm {
    /// Freezes the form into a [`SubmissionRequest`], rejecting anything that
    /// would fail before the first remote call.
    pub fn validate(&self, max_image_bytes: usize) -> Result<SubmissionRequest, ValidationError> {
        if self.image.is_none() {
            return Err(ValidationError::MissingImage);
        }

        let decimals = parse_decimals(&self.decimals)?;
        let initial_supply = parse_supply(&self.initial_supply)?;

        SubmissionRequest::new(
            SubmissionRequestParams {
                name: self.name.clone(),
                symbol: self.symbol.clone(),
                initial_supply,
                decimals,
                description: self.description.clone(),
                image: self.image.clone(),
                socials: self.socials_enabled.then(|| self.socials.clone()),
                revocation: AuthorityRevocation {
                    mint: self.revoke_mint_authority,
                    freeze: self.revoke_freeze_authority,
                },
            },
            max_image_bytes,
        )
    }

    /// Checks a freshly selected image against the size limit before it is
    /// stored on the form.
    pub fn select_image(
        &mut self,
        image: ImageFile,
        max_image_bytes: usize,
    ) -> Result<(), ValidationError> {
        if image.len() > max_image_bytes {
            return Err(ValidationError::ImageTooLarge {
                size: image.len(),
                limit: max_image_bytes,
            });
        }
        self.image = Some(image);
        Ok(())
    }
}

fn parse_decimals(raw: &str) -> Result<u8, ValidationError> {
    let invalid = || ValidationError::InvalidDecimals {
        value: raw.to_owned(),
    };
    let value = raw.trim().parse::<i64>().map_err(|_| invalid())?;
    if !(0..=i64::from(MAX_DECIMALS)).contains(&value) {
        return Err(invalid());
    }
    u8::try_from(value).map_err(|_| invalid())
}

fn parse_supply(raw: &str) -> Result<u64, ValidationError> {
    let invalid = || ValidationError::InvalidSupply {
        value: raw.to_owned(),
    };
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(invalid()),
        Ok(value) => Ok(value),
    }
}
