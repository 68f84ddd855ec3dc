use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest decimal precision accepted for a new mint.
pub const MAX_DECIMALS: u8 = 9;
/// Default upper bound on the image payload (5 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
/// Metaplex on-chain limits for the `DataV2` name and symbol fields.
pub const MAX_NAME_LENGTH: usize = 32;
pub const MAX_SYMBOL_LENGTH: usize = 10;

/// Rejections raised before any remote call is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingName,
    MissingSymbol,
    NameTooLong { length: usize },
    SymbolTooLong { length: usize },
    InvalidDecimals { value: String },
    InvalidSupply { value: String },
    SupplyOverflow { supply: u64, decimals: u8 },
    MissingImage,
    EmptyImage,
    ImageTooLarge { size: usize, limit: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingName => write!(f, "Token name is required"),
            ValidationError::MissingSymbol => write!(f, "Token symbol is required"),
            ValidationError::NameTooLong { length } => write!(
                f,
                "Token name is {length} bytes; at most {MAX_NAME_LENGTH} are allowed"
            ),
            ValidationError::SymbolTooLong { length } => write!(
                f,
                "Token symbol is {length} bytes; at most {MAX_SYMBOL_LENGTH} are allowed"
            ),
            ValidationError::InvalidDecimals { value } => {
                write!(f, "Decimals must be between 0 and {MAX_DECIMALS} (got '{value}')")
            }
            ValidationError::InvalidSupply { value } => {
                write!(f, "Initial supply must be greater than 0 (got '{value}')")
            }
            ValidationError::SupplyOverflow { supply, decimals } => write!(
                f,
                "Initial supply {supply} with {decimals} decimals exceeds the maximum token amount"
            ),
            ValidationError::MissingImage => write!(f, "A token image is required"),
            ValidationError::EmptyImage => write!(f, "The token image is empty"),
            ValidationError::ImageTooLarge { size, limit } => write!(
                f,
                "File size too large ({size} bytes). Please choose an image under {limit} bytes."
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Raw image payload selected by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Optional social links embedded in the metadata document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub website: String,
    pub twitter: String,
    pub telegram: String,
    pub discord: String,
}

/// Which authorities the user asked to give up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorityRevocation {
    pub mint: bool,
    pub freeze: bool,
}

impl AuthorityRevocation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn any(&self) -> bool {
        self.mint || self.freeze
    }
}

pub struct SubmissionRequestParams {
    pub name: String,
    pub symbol: String,
    pub initial_supply: u64,
    pub decimals: u8,
    pub description: String,
    pub image: Option<ImageFile>,
    pub socials: Option<SocialLinks>,
    pub revocation: AuthorityRevocation,
}

/// Validated, immutable description of the token to mint.
///
/// Only constructible through [`SubmissionRequest::new`] (or the form parser),
/// so every instance satisfies the decimals, supply and image invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    name: String,
    symbol: String,
    initial_supply: u64,
    decimals: u8,
    mint_amount: u64,
    description: String,
    image: ImageFile,
    socials: Option<SocialLinks>,
    revocation: AuthorityRevocation,
}

impl SubmissionRequest {
    pub fn new(
        params: SubmissionRequestParams,
        max_image_bytes: usize,
    ) -> Result<Self, ValidationError> {
        let SubmissionRequestParams {
            name,
            symbol,
            initial_supply,
            decimals,
            description,
            image,
            socials,
            revocation,
        } = params;

        let name = name.trim().to_owned();
        let symbol = symbol.trim().to_owned();

        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(ValidationError::NameTooLong { length: name.len() });
        }
        if symbol.is_empty() {
            return Err(ValidationError::MissingSymbol);
        }
        if symbol.len() > MAX_SYMBOL_LENGTH {
            return Err(ValidationError::SymbolTooLong {
                length: symbol.len(),
            });
        }

        let image = image.ok_or(ValidationError::MissingImage)?;
        if image.is_empty() {
            return Err(ValidationError::EmptyImage);
        }
        if image.len() > max_image_bytes {
            return Err(ValidationError::ImageTooLarge {
                size: image.len(),
                limit: max_image_bytes,
            });
        }

        if decimals > MAX_DECIMALS {
            return Err(ValidationError::InvalidDecimals {
                value: decimals.to_string(),
            });
        }
        if initial_supply == 0 {
            return Err(ValidationError::InvalidSupply {
                value: initial_supply.to_string(),
            });
        }
        let mint_amount = mint_amount(initial_supply, decimals)?;

        Ok(Self {
            name,
            symbol,
            initial_supply,
            decimals,
            mint_amount,
            description: description.trim().to_owned(),
            image,
            socials,
            revocation,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn initial_supply(&self) -> u64 {
        self.initial_supply
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Base units minted to the caller: `initial_supply * 10^decimals`.
    pub fn mint_amount(&self) -> u64 {
        self.mint_amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image(&self) -> &ImageFile {
        &self.image
    }

    pub fn socials(&self) -> Option<&SocialLinks> {
        self.socials.as_ref()
    }

    pub fn revocation(&self) -> AuthorityRevocation {
        self.revocation
    }
}

/// Scales a whole-token supply into base units without wrapping.
pub fn mint_amount(initial_supply: u64, decimals: u8) -> Result<u64, ValidationError> {
    10u64
        .checked_pow(u32::from(decimals))
        .and_then(|scale| initial_supply.checked_mul(scale))
        .ok_or(ValidationError::SupplyOverflow {
            supply: initial_supply,
            decimals,
        })
}
