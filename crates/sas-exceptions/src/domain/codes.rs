//! # Exception Codes and Delivery Groups
//!
//! The closed set of SAS general exception codes this EGM can raise, and the
//! static table routing each code to the delivery group hosts subscribe to.
//!
//! ## Routing Table
//!
//! | Group | Codes |
//! |-------|-------|
//! | `General` | doors, power, tilts, bills, memory, printer, menus, overflow |
//! | `Aft` | `0x69..=0x6F` |
//! | `Validation` | `0x3D`, `0x3E`, `0x3F`, `0x57`, `0x67`, `0x68` |
//! | `GeneralControl` | handpay, option changes, meter resets |
//! | `LegacyBonus` | `0x7C` |
//! | `Progressive` | `0x53`, `0x54`, `0x56` |
//! | `GameStartEnd` | `0x7E`, `0x7F` |
//!
//! `NoActivity` belongs to no group and can never be reported.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! exception_codes {
    ($( $(#[$meta:meta])* $name:ident = $value:literal ),+ $(,)?) => {
        /// SAS general exception code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum ExceptionCode {
            $( $(#[$meta])* $name = $value, )+
        }

        impl ExceptionCode {
            /// Every known code, in ascending wire value.
            pub const ALL: &'static [ExceptionCode] = &[ $( ExceptionCode::$name, )+ ];

            /// Convert from the raw wire byte.
            #[must_use]
            pub fn from_u8(value: u8) -> Option<Self> {
                match value {
                    $( $value => Some(Self::$name), )+
                    _ => None,
                }
            }

            /// Name of the code, without the wire value.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name), )+
                }
            }
        }
    };
}

exception_codes! {
    /// Nothing pending; the answer to a general poll with an empty queue.
    NoActivity = 0x00,
    SlotDoorOpened = 0x11,
    SlotDoorClosed = 0x12,
    DropDoorOpened = 0x13,
    DropDoorClosed = 0x14,
    CardCageOpened = 0x15,
    CardCageClosed = 0x16,
    AcPowerApplied = 0x17,
    AcPowerLost = 0x18,
    CashboxDoorOpened = 0x19,
    CashboxDoorClosed = 0x1A,
    CashboxRemoved = 0x1B,
    CashboxInstalled = 0x1C,
    BellyDoorOpened = 0x1D,
    BellyDoorClosed = 0x1E,
    NoActivityWaitingForPlayerInput = 0x1F,
    GeneralTilt = 0x20,
    CoinInTilt = 0x21,
    CoinOutTilt = 0x22,
    HopperEmptyDetected = 0x23,
    ExtraCoinPaid = 0x24,
    DiverterMalfunction = 0x25,
    CashboxFullDetected = 0x27,
    BillJam = 0x28,
    BillAcceptorHardwareFailure = 0x29,
    ReverseBillDetected = 0x2A,
    BillRejected = 0x2B,
    CounterfeitBillDetected = 0x2C,
    ReverseCoinInDetected = 0x2D,
    CashboxNearFullDetected = 0x2E,
    CmosRamErrorDataRecovered = 0x31,
    CmosRamErrorNoDataRecovered = 0x32,
    CmosRamErrorBadDevice = 0x33,
    EepromErrorDataError = 0x34,
    EepromErrorBadDevice = 0x35,
    EpromErrorDifferentChecksum = 0x36,
    EpromErrorBadChecksumCompare = 0x37,
    PartitionedEpromErrorDifferentChecksum = 0x38,
    PartitionedEpromErrorBadChecksumCompare = 0x39,
    MemoryErrorReset = 0x3A,
    LowBackupBatteryDetected = 0x3B,
    OperatorChangedOptions = 0x3C,
    CashOutTicketPrinted = 0x3D,
    HandpayValidated = 0x3E,
    ValidationIdNotConfigured = 0x3F,
    ReelTilt = 0x40,
    Reel1Tilt = 0x41,
    Reel2Tilt = 0x42,
    Reel3Tilt = 0x43,
    Reel4Tilt = 0x44,
    Reel5Tilt = 0x45,
    ReelDisconnected = 0x46,
    Bill1Accepted = 0x47,
    Bill5Accepted = 0x48,
    Bill10Accepted = 0x49,
    Bill20Accepted = 0x4A,
    Bill50Accepted = 0x4B,
    Bill100Accepted = 0x4C,
    Bill2Accepted = 0x4D,
    Bill500Accepted = 0x4E,
    BillAccepted = 0x4F,
    Bill200Accepted = 0x50,
    HandpayIsPending = 0x51,
    HandpayWasReset = 0x52,
    NoProgressiveInfoForFiveSeconds = 0x53,
    ProgressiveWin = 0x54,
    PlayerCancelledHandpay = 0x55,
    SasProgressiveLevelHit = 0x56,
    SystemValidationRequest = 0x57,
    PrinterCommunicationError = 0x60,
    PrinterPaperOut = 0x61,
    CashOutButtonPressed = 0x66,
    TicketHasBeenInserted = 0x67,
    TicketTransferComplete = 0x68,
    AftTransferComplete = 0x69,
    AftRequestForHostCashout = 0x6A,
    AftRequestForHostToCashOutWin = 0x6B,
    AftRequestToRegister = 0x6C,
    AftRegistrationAcknowledged = 0x6D,
    AftRegistrationCancelled = 0x6E,
    GameLocked = 0x6F,
    /// Raised by the queue itself when a normal exception could not be kept.
    ExceptionBufferOverflow = 0x70,
    ChangeLampOn = 0x71,
    ChangeLampOff = 0x72,
    PrinterPaperLow = 0x74,
    PrinterPowerOff = 0x75,
    PrinterPowerOn = 0x76,
    ReplacePrinterRibbon = 0x77,
    PrinterCarriageJammed = 0x78,
    CoinInLockoutMalfunction = 0x79,
    GameSoftMetersReset = 0x7A,
    BillValidatorTotalsReset = 0x7B,
    LegacyBonusPayAwarded = 0x7C,
    GameStarted = 0x7E,
    GameEnded = 0x7F,
    HopperFullDetected = 0x80,
    HopperLevelLowDetected = 0x81,
    DisplayMetersOrAttendantMenuEntered = 0x82,
    DisplayMetersOrAttendantMenuExited = 0x83,
    SelfTestOrOperatorMenuEntered = 0x84,
    SelfTestOrOperatorMenuExited = 0x85,
    GamingMachineOutOfService = 0x86,
    PlayerRequestedDrawCards = 0x87,
    ReelNHasStopped = 0x88,
    CoinCreditWagered = 0x89,
    GameRecallEntryDisplayed = 0x8A,
    CardHeldOrNotHeld = 0x8B,
    GameSelected = 0x8C,
    ComponentListChanged = 0x8E,
    AuthenticationComplete = 0x8F,
    PowerOffCardCageAccess = 0x98,
    PowerOffSlotDoorAccess = 0x99,
    PowerOffCashboxDoorAccess = 0x9A,
    PowerOffDropDoorAccess = 0x9B,
}

impl ExceptionCode {
    /// Get the raw wire byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Resolve the delivery group hosts subscribe to for this code.
    ///
    /// Returns `None` for codes that are never routed (`NoActivity`).
    #[must_use]
    pub const fn delivery_group(self) -> Option<DeliveryGroup> {
        use ExceptionCode::*;
        let group = match self {
            NoActivity => return None,

            AftTransferComplete
            | AftRequestForHostCashout
            | AftRequestForHostToCashOutWin
            | AftRequestToRegister
            | AftRegistrationAcknowledged
            | AftRegistrationCancelled
            | GameLocked => DeliveryGroup::Aft,

            CashOutTicketPrinted
            | HandpayValidated
            | ValidationIdNotConfigured
            | SystemValidationRequest
            | TicketHasBeenInserted
            | TicketTransferComplete => DeliveryGroup::Validation,

            HandpayIsPending
            | HandpayWasReset
            | PlayerCancelledHandpay
            | OperatorChangedOptions
            | GameSoftMetersReset
            | BillValidatorTotalsReset => DeliveryGroup::GeneralControl,

            LegacyBonusPayAwarded => DeliveryGroup::LegacyBonus,

            NoProgressiveInfoForFiveSeconds | ProgressiveWin | SasProgressiveLevelHit => {
                DeliveryGroup::Progressive
            }

            GameStarted | GameEnded => DeliveryGroup::GameStartEnd,

            _ => DeliveryGroup::General,
        };
        Some(group)
    }
}

impl TryFrom<u8> for ExceptionCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(value)
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), self.as_u8())
    }
}

/// Subscription category partitioning exception codes between host clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeliveryGroup {
    /// Baseline events every connected client receives.
    General,
    /// Advanced funds transfer.
    Aft,
    /// Ticket and handpay validation.
    Validation,
    /// Events reserved for the host holding general control.
    GeneralControl,
    LegacyBonus,
    Progressive,
    /// Game start/end reporting.
    GameStartEnd,
}

impl DeliveryGroup {
    /// All groups, in declaration order.
    pub const ALL: [DeliveryGroup; 7] = [
        DeliveryGroup::General,
        DeliveryGroup::Aft,
        DeliveryGroup::Validation,
        DeliveryGroup::GeneralControl,
        DeliveryGroup::LegacyBonus,
        DeliveryGroup::Progressive,
        DeliveryGroup::GameStartEnd,
    ];
}

impl fmt::Display for DeliveryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::General => "general",
            Self::Aft => "aft",
            Self::Validation => "validation",
            Self::GeneralControl => "general-control",
            Self::LegacyBonus => "legacy-bonus",
            Self::Progressive => "progressive",
            Self::GameStartEnd => "game-start-end",
        };
        f.write_str(name)
    }
}
