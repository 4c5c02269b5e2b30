//! Request signature expected by the marketplace's v2 item endpoint.

use md5::{Digest, Md5};

/// Header the v2 endpoint inspects for the signature.
pub const SIGNATURE_HEADER: &str = "if-none-match-";

const SALT: &str = "55b03";

/// Computes `"55b03-" + md5("55b03" + md5("itemid=<item>&shopid=<shop>") + "55b03")`.
///
/// The endpoint ignores requests whose header does not match this exact
/// construction, so both digests are lowercase hex.
#[must_use]
pub fn v2_signature(item_id: &str, shop_id: &str) -> String {
    let query = format!("itemid={item_id}&shopid={shop_id}");
    let inner = md5_hex(query.as_bytes());
    let outer = md5_hex(format!("{SALT}{inner}{SALT}").as_bytes());
    format!("{SALT}-{outer}")
}

fn md5_hex(input: &[u8]) -> String {
    format!("{:x}", Md5::digest(input))
}
