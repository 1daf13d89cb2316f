//! Acceptance filter bring-up.
//!
//! The filter bank is hardware shared between both controller instances: the
//! master bank owns the registers and `can2_start_bank` splits the banks
//! between the two controllers. Only [crate::can::ControllerId::Primary]
//! programs it; the secondary instance relies on the bank being configured by
//! the primary.

use crate::registers::{FilterMasterReg, Register, RegisterBank};

/// First filter bank assigned to the secondary controller
pub(crate) const SECONDARY_START_BANK: u8 = 14;

/// FS1R mask selecting single 32-bit scale for every bank
const ALL_BANKS_32BIT_SCALE: u32 = 0x07FF_FFFF;

/// Programs one pass-all filter per controller.
///
/// Bank 0 feeds the primary controller, bank [SECONDARY_START_BANK] the
/// secondary one. A zero identifier/mask pair in mask mode matches every
/// frame, delivering it to receive queue 0.
pub(crate) fn configure_accept_all<B: RegisterBank>(bank: &mut B) {
    let master = FilterMasterReg::from(bank.read(Register::FilterMaster))
        .with_can2_start_bank(SECONDARY_START_BANK);
    bank.write(Register::FilterMaster, master.with_finit(true).into());

    bank.write(Register::FilterBankId(0), 0);
    bank.write(Register::FilterBankMask(0), 0);
    bank.write(Register::FilterBankId(SECONDARY_START_BANK), 0);
    bank.write(Register::FilterBankMask(SECONDARY_START_BANK), 0);

    bank.write(Register::FilterMode, 0);
    bank.write(Register::FilterFifoAssignment, 0);
    bank.write(Register::FilterScale, ALL_BANKS_32BIT_SCALE);
    bank.write(
        Register::FilterActivation,
        1 | (1 << u32::from(SECONDARY_START_BANK)),
    );

    bank.write(Register::FilterMaster, master.with_finit(false).into());
}
