//! Instruction builders for every on-chain step of a submission. Nothing here
//! touches the network, so the exact instruction sets can be asserted in tests.

use crate::submission::{AuthorityRevocation, SubmissionRequest};
use anyhow::{Context, Result};
use mpl_token_metadata::accounts::Metadata;
use mpl_token_metadata::instructions::CreateMetadataAccountV3Builder;
use mpl_token_metadata::types::{Creator, DataV2};
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_instruction;
use spl_associated_token_account::get_associated_token_address;
use spl_associated_token_account::instruction::create_associated_token_account;
use spl_token::instruction::{initialize_mint2, mint_to, set_authority, AuthorityType};
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;

/// Size of an SPL Token mint account.
pub const MINT_ACCOUNT_LEN: usize = Mint::LEN;

pub fn fee_transfer(payer: &Pubkey, fee_address: &Pubkey, lamports: u64) -> Instruction {
    system_instruction::transfer(payer, fee_address, lamports)
}

/// Accounts and amounts used to create the mint and fund the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintPlan {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub decimals: u8,
    pub amount: u64,
    pub mint_authority: Pubkey,
    pub freeze_authority: Option<Pubkey>,
}

impl MintPlan {
    /// The mint authority always starts with the owner: SPL Token needs it to
    /// mint the initial supply and the metadata program needs it as a signer.
    /// A requested freeze revocation is honoured by never assigning one.
    pub fn for_request(mint: Pubkey, owner: Pubkey, request: &SubmissionRequest) -> Self {
        let revocation = request.revocation();
        Self {
            mint,
            owner,
            decimals: request.decimals(),
            amount: request.mint_amount(),
            mint_authority: owner,
            freeze_authority: (!revocation.freeze).then_some(owner),
        }
    }

    pub fn token_account(&self) -> Pubkey {
        get_associated_token_address(&self.owner, &self.mint)
    }
}

/// `create_account` + `initialize_mint2` + associated account + `mint_to`,
/// in that order, for a single transaction.
pub fn create_mint_with_associated_token(
    plan: &MintPlan,
    rent_lamports: u64,
) -> Result<Vec<Instruction>> {
    let token_program = spl_token::id();

    let create_account = system_instruction::create_account(
        &plan.owner,
        &plan.mint,
        rent_lamports,
        MINT_ACCOUNT_LEN as u64,
        &token_program,
    );
    let initialize = initialize_mint2(
        &token_program,
        &plan.mint,
        &plan.mint_authority,
        plan.freeze_authority.as_ref(),
        plan.decimals,
    )
    .context("failed to build initialize_mint2 instruction")?;
    let create_ata =
        create_associated_token_account(&plan.owner, &plan.owner, &plan.mint, &token_program);
    let mint_supply = mint_to(
        &token_program,
        &plan.mint,
        &plan.token_account(),
        &plan.mint_authority,
        &[],
        plan.amount,
    )
    .context("failed to build mint_to instruction")?;

    Ok(vec![create_account, initialize, create_ata, mint_supply])
}

pub fn metadata_address(mint: &Pubkey) -> Pubkey {
    Metadata::find_pda(mint).0
}

/// Attaches fungible metadata with the authority as sole verified creator.
/// The account stays mutable so it can be updated later.
pub fn create_fungible_metadata(
    mint: &Pubkey,
    authority: &Pubkey,
    name: &str,
    symbol: &str,
    uri: &str,
) -> Instruction {
    let data = DataV2 {
        name: name.to_owned(),
        symbol: symbol.to_owned(),
        uri: uri.to_owned(),
        seller_fee_basis_points: 0,
        creators: Some(vec![Creator {
            address: *authority,
            verified: true,
            share: 100,
        }]),
        collection: None,
        uses: None,
    };

    CreateMetadataAccountV3Builder::new()
        .metadata(metadata_address(mint))
        .mint(*mint)
        .mint_authority(*authority)
        .payer(*authority)
        .update_authority(*authority, true)
        .data(data)
        .is_mutable(true)
        .instruction()
}

/// Authorities still held after creation that must be set to `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevocationPlan {
    pub mint: bool,
    pub freeze: bool,
}

impl RevocationPlan {
    pub fn after_creation(requested: AuthorityRevocation, plan: &MintPlan) -> Self {
        Self {
            mint: requested.mint,
            freeze: requested.freeze && plan.freeze_authority.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.mint && !self.freeze
    }
}

/// One `SetAuthority(None)` per held authority, freeze before mint.
pub fn revoke_authorities(
    mint: &Pubkey,
    current_authority: &Pubkey,
    plan: RevocationPlan,
) -> Result<Vec<Instruction>> {
    let token_program = spl_token::id();
    let mut instructions = Vec::with_capacity(2);

    if plan.freeze {
        instructions.push(
            set_authority(
                &token_program,
                mint,
                None,
                AuthorityType::FreezeAccount,
                current_authority,
                &[],
            )
            .context("failed to build freeze authority revocation")?,
        );
    }

    if plan.mint {
        instructions.push(
            set_authority(
                &token_program,
                mint,
                None,
                AuthorityType::MintTokens,
                current_authority,
                &[],
            )
            .context("failed to build mint authority revocation")?,
        );
    }

    Ok(instructions)
}
