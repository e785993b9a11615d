//! FFI Layer
//!
//! All C-ABI exports are defined here. This is the ONLY file that should
//! contain `extern "C"` functions. Conventions:
//! - Wallets are opaque handles released with `hd_wallet_free`
//! - Inputs are NUL-terminated UTF-8 strings, nullable where documented
//! - Returned strings are owned by the caller and released with
//!   `hd_wallet_free_string`
//! - Fallible calls return `0` on success, otherwise an `ErrorCode` integer

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::{ErrorCode, WalletError, WalletResult};
use crate::wallet::HdWallet;
use crate::{log_debug, log_warn};

/// Return code for success
pub const HD_WALLET_OK: i32 = 0;

// =============================================================================
// Memory Management
// =============================================================================

/// Free a string returned by any hd_wallet_* function
///
/// # Safety
/// The pointer must have been returned by an hd_wallet_* function and not
/// freed before.
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(s));
    }
}

/// Release a wallet handle
///
/// # Safety
/// The handle must come from an hd_wallet_* constructor and not be used
/// after this call.
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_free(handle: *mut HdWallet) {
    if handle.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(handle));
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Borrow a required C string argument
fn parse_input<'a>(input: *const c_char, name: &str) -> WalletResult<&'a str> {
    if input.is_null() {
        return Err(WalletError::invalid_input(format!("Null {} pointer", name)));
    }

    let c_str = unsafe { CStr::from_ptr(input) };
    c_str
        .to_str()
        .map_err(|_| WalletError::invalid_input(format!("{} is not valid UTF-8", name)))
}

/// Borrow a nullable C string argument
fn parse_optional<'a>(input: *const c_char, name: &str) -> WalletResult<Option<&'a str>> {
    if input.is_null() {
        return Ok(None);
    }
    parse_input(input, name).map(Some)
}

fn wallet_ref<'a>(handle: *const HdWallet) -> Option<&'a HdWallet> {
    unsafe { handle.as_ref() }
}

/// Convert Rust string to C string pointer (null if it holds a NUL byte)
fn string_to_ptr(s: String) -> *mut c_char {
    CString::new(s).map(CString::into_raw).unwrap_or(ptr::null_mut())
}

/// Log a failed call and turn it into its return code
fn error_code(operation: &'static str, error: &WalletError) -> i32 {
    log_warn!(
        "ffi",
        "Call failed",
        operation = operation,
        code = error.code.as_i32(),
        reason = error.message
    );
    error.code.as_i32()
}

fn store_wallet(operation: &'static str, result: WalletResult<HdWallet>, out: *mut *mut HdWallet) -> i32 {
    if out.is_null() {
        return error_code(operation, &WalletError::invalid_input("Null output pointer"));
    }

    match result {
        Ok(wallet) => {
            log_debug!(
                "ffi",
                "Wallet created",
                operation = operation,
                coin_type = wallet.coin_type(),
                address = wallet.bip44_address()
            );
            unsafe { *out = Box::into_raw(Box::new(wallet)) };
            HD_WALLET_OK
        }
        Err(e) => {
            unsafe { *out = ptr::null_mut() };
            error_code(operation, &e)
        }
    }
}

fn store_string(operation: &'static str, result: WalletResult<String>, out: *mut *mut c_char) -> i32 {
    if out.is_null() {
        return error_code(operation, &WalletError::invalid_input("Null output pointer"));
    }

    let result = result.and_then(|s| {
        CString::new(s).map_err(|_| WalletError::internal("Output contains a NUL byte"))
    });

    match result {
        Ok(c_str) => {
            unsafe { *out = c_str.into_raw() };
            HD_WALLET_OK
        }
        Err(e) => {
            unsafe { *out = ptr::null_mut() };
            error_code(operation, &e)
        }
    }
}

// =============================================================================
// Construction
// =============================================================================

/// Create a wallet from a coin type and an optional hex seed.
///
/// A null `seed_hex` generates a fresh 12-word mnemonic.
///
/// # Safety
/// `seed_hex` must be null or a valid C string; `out` must be writable.
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_new(coin_type: u32, seed_hex: *const c_char, out: *mut *mut HdWallet) -> i32 {
    let result = parse_optional(seed_hex, "seed_hex").and_then(|seed| HdWallet::new(coin_type, seed));
    store_wallet("hd_wallet_new", result, out)
}

/// Create a wallet from a network flag and an optional mnemonic phrase.
///
/// A null `mnemonic` generates a fresh phrase.
///
/// # Safety
/// `mnemonic` must be null or a valid C string; `out` must be writable.
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_from_mnemonic(
    network_flag: u32,
    mnemonic: *const c_char,
    out: *mut *mut HdWallet,
) -> i32 {
    let result = parse_optional(mnemonic, "mnemonic")
        .and_then(|phrase| HdWallet::from_mnemonic(network_flag, phrase));
    store_wallet("hd_wallet_from_mnemonic", result, out)
}

/// Create a wallet from a serialized root key (xprv/tprv)
///
/// # Safety
/// `xprv` must be a valid C string; `out` must be writable.
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_from_master_priv(xprv: *const c_char, out: *mut *mut HdWallet) -> i32 {
    let result = parse_input(xprv, "xprv").and_then(HdWallet::from_master_priv);
    store_wallet("hd_wallet_from_master_priv", result, out)
}

// =============================================================================
// Queries
// =============================================================================

/// Canonical BIP44 address, or null for a null handle
///
/// # Safety
/// `handle` must be null or a live wallet handle.
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_bip44_address(handle: *const HdWallet) -> *mut c_char {
    match wallet_ref(handle) {
        Some(wallet) => string_to_ptr(wallet.bip44_address()),
        None => ptr::null_mut(),
    }
}

/// Export the mnemonic phrase into `out`
///
/// # Safety
/// `handle` must be null or a live wallet handle; `out` must be writable.
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_export_mnemonic(handle: *const HdWallet, out: *mut *mut c_char) -> i32 {
    let result = wallet_ref(handle)
        .ok_or_else(|| WalletError::invalid_input("Null wallet handle"))
        .and_then(HdWallet::export_mnemonic);
    store_string("hd_wallet_export_mnemonic", result, out)
}

/// BIP32 root key as xprv/tprv, or null for a null handle
///
/// # Safety
/// `handle` must be null or a live wallet handle.
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_export_master_priv(handle: *const HdWallet) -> *mut c_char {
    match wallet_ref(handle) {
        Some(wallet) => string_to_ptr(wallet.export_master_priv()),
        None => ptr::null_mut(),
    }
}

/// BIP86 Taproot address into `out`; Bitcoin coins only
///
/// # Safety
/// `handle` must be null or a live wallet handle; `out` must be writable.
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_bip86_address(handle: *const HdWallet, out: *mut *mut c_char) -> i32 {
    let result = wallet_ref(handle)
        .ok_or_else(|| WalletError::invalid_input("Null wallet handle"))
        .and_then(HdWallet::bip86_address);
    store_string("hd_wallet_bip86_address", result, out)
}

/// Ethereum address at m/44'/60'/0'/0/0, or null on failure
///
/// # Safety
/// `handle` must be null or a live wallet handle.
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_evm_address(handle: *const HdWallet) -> *mut c_char {
    let Some(wallet) = wallet_ref(handle) else {
        return ptr::null_mut();
    };
    match wallet.evm_address() {
        Ok(address) => string_to_ptr(address),
        Err(e) => {
            error_code("hd_wallet_evm_address", &e);
            ptr::null_mut()
        }
    }
}

// =============================================================================
// Private Keys
// =============================================================================

fn export_with<F>(operation: &'static str, handle: *const HdWallet, out: *mut *mut c_char, f: F) -> i32
where
    F: FnOnce(&HdWallet) -> WalletResult<String>,
{
    let result = wallet_ref(handle)
        .ok_or_else(|| WalletError::invalid_input("Null wallet handle"))
        .and_then(f);
    store_string(operation, result, out)
}

/// Hex private key of the canonical BIP44 leaf into `out`
///
/// # Safety
/// `handle` must be null or a live wallet handle; `out` must be writable.
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_bip44_priv_hex(handle: *const HdWallet, out: *mut *mut c_char) -> i32 {
    export_with("hd_wallet_bip44_priv_hex", handle, out, HdWallet::bip44_priv_hex)
}

/// Hex private key at m/86'/coin'/0'/0/0 into `out`; Bitcoin coins only
///
/// # Safety
/// `handle` must be null or a live wallet handle; `out` must be writable.
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_bip86_priv_hex(handle: *const HdWallet, out: *mut *mut c_char) -> i32 {
    export_with("hd_wallet_bip86_priv_hex", handle, out, HdWallet::bip86_priv_hex)
}

/// Taproot-tweaked BIP86 private key into `out`.
///
/// A null `merkle_root_hex` means key-path spending only.
///
/// # Safety
/// `handle` must be null or a live wallet handle; `merkle_root_hex` must be
/// null or a valid C string; `out` must be writable.
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_bip86_tweaked_priv_hex(
    handle: *const HdWallet,
    merkle_root_hex: *const c_char,
    out: *mut *mut c_char,
) -> i32 {
    export_with("hd_wallet_bip86_tweaked_priv_hex", handle, out, |wallet| {
        let merkle_root = parse_optional(merkle_root_hex, "merkle_root_hex")?;
        wallet.bip86_tweaked_priv_hex(merkle_root)
    })
}

/// Hex private key at m/44'/60'/0'/0/0 into `out`
///
/// # Safety
/// `handle` must be null or a live wallet handle; `out` must be writable.
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_evm_priv_hex(handle: *const HdWallet, out: *mut *mut c_char) -> i32 {
    export_with("hd_wallet_evm_priv_hex", handle, out, HdWallet::evm_priv_hex)
}

/// Human readable description of a return code
#[unsafe(no_mangle)]
pub extern "C" fn hd_wallet_error_message(code: i32) -> *mut c_char {
    let message = match code {
        HD_WALLET_OK => "success",
        _ => ErrorCode::from_i32(code)
            .map(ErrorCode::description)
            .unwrap_or("unknown error code"),
    };
    string_to_ptr(message.to_string())
}
