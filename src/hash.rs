//! Archive path hashing
//!
//! Entries inside SCS containers are addressed by CityHash64 (v1.1) of their
//! virtual path. The hash output is part of the archive's public contract, so
//! this implementation must stay bit-identical to the reference algorithm.

const K0: u64 = 0xc3a5_c85c_97cb_3127;
const K1: u64 = 0xb492_b66f_be98_f273;
const K2: u64 = 0x9ae1_6a3b_2f90_404f;
const K_MUL: u64 = 0x9ddf_ea08_eb38_2d69;

#[inline]
fn fetch64(s: &[u8]) -> u64 {
    u64::from_le_bytes(s[..8].try_into().unwrap())
}

#[inline]
fn fetch32(s: &[u8]) -> u64 {
    u64::from(u32::from_le_bytes(s[..4].try_into().unwrap()))
}

#[inline]
fn rotate(val: u64, shift: u32) -> u64 {
    // Right rotation; shift is never 0 at call sites but guard anyway
    if shift == 0 {
        val
    } else {
        (val >> shift) | (val << (64 - shift))
    }
}

#[inline]
fn shift_mix(val: u64) -> u64 {
    val ^ (val >> 47)
}

#[inline]
fn hash_len_16(u: u64, v: u64, mul: u64) -> u64 {
    let mut a = (u ^ v).wrapping_mul(mul);
    a ^= a >> 47;
    let mut b = (v ^ a).wrapping_mul(mul);
    b ^= b >> 47;
    b.wrapping_mul(mul)
}

fn hash_len_0_to_16(s: &[u8]) -> u64 {
    let len = s.len();
    if len >= 8 {
        let mul = K2.wrapping_add(len as u64 * 2);
        let a = fetch64(s).wrapping_add(K2);
        let b = fetch64(&s[len - 8..]);
        let c = rotate(b, 37).wrapping_mul(mul).wrapping_add(a);
        let d = rotate(a, 25).wrapping_add(b).wrapping_mul(mul);
        return hash_len_16(c, d, mul);
    }
    if len >= 4 {
        let mul = K2.wrapping_add(len as u64 * 2);
        let a = fetch32(s);
        return hash_len_16(len as u64 + (a << 3), fetch32(&s[len - 4..]), mul);
    }
    if len > 0 {
        let a = u64::from(s[0]);
        let b = u64::from(s[len >> 1]);
        let c = u64::from(s[len - 1]);
        let y = a.wrapping_add(b << 8);
        let z = (len as u64).wrapping_add(c << 2);
        return shift_mix(y.wrapping_mul(K2) ^ z.wrapping_mul(K0)).wrapping_mul(K2);
    }
    K2
}

fn hash_len_17_to_32(s: &[u8]) -> u64 {
    let len = s.len();
    let mul = K2.wrapping_add(len as u64 * 2);
    let a = fetch64(s).wrapping_mul(K1);
    let b = fetch64(&s[8..]);
    let c = fetch64(&s[len - 8..]).wrapping_mul(mul);
    let d = fetch64(&s[len - 16..]).wrapping_mul(K2);
    hash_len_16(
        rotate(a.wrapping_add(b), 43)
            .wrapping_add(rotate(c, 30))
            .wrapping_add(d),
        a.wrapping_add(rotate(b.wrapping_add(K2), 18)).wrapping_add(c),
        mul,
    )
}

fn hash_len_33_to_64(s: &[u8]) -> u64 {
    let len = s.len();
    let mul = K2.wrapping_add(len as u64 * 2);
    let mut a = fetch64(s).wrapping_mul(K2);
    let mut b = fetch64(&s[8..]);
    let c = fetch64(&s[len - 24..]);
    let d = fetch64(&s[len - 32..]);
    let e = fetch64(&s[16..]).wrapping_mul(K2);
    let f = fetch64(&s[24..]).wrapping_mul(9);
    let g = fetch64(&s[len - 8..]);
    let h = fetch64(&s[len - 16..]).wrapping_mul(mul);

    let u = rotate(a.wrapping_add(g), 43)
        .wrapping_add(rotate(b, 30).wrapping_add(c).wrapping_mul(9));
    let v = (a.wrapping_add(g) ^ d).wrapping_add(f).wrapping_add(1);
    let w = u.wrapping_add(v).wrapping_mul(mul).swap_bytes().wrapping_add(h);
    let x = rotate(e.wrapping_add(f), 42).wrapping_add(c);
    let y = v
        .wrapping_add(w)
        .wrapping_mul(mul)
        .swap_bytes()
        .wrapping_add(g)
        .wrapping_mul(mul);
    let z = e.wrapping_add(f).wrapping_add(c);
    a = x
        .wrapping_add(z)
        .wrapping_mul(mul)
        .wrapping_add(y)
        .swap_bytes()
        .wrapping_add(b);
    b = shift_mix(
        z.wrapping_add(a)
            .wrapping_mul(mul)
            .wrapping_add(d)
            .wrapping_add(h),
    )
    .wrapping_mul(mul);
    b.wrapping_add(x)
}

fn weak_hash_len_32_with_seeds(s: &[u8], a: u64, b: u64) -> (u64, u64) {
    let w = fetch64(s);
    let x = fetch64(&s[8..]);
    let y = fetch64(&s[16..]);
    let z = fetch64(&s[24..]);

    let mut a = a.wrapping_add(w);
    let mut b = rotate(b.wrapping_add(a).wrapping_add(z), 21);
    let c = a;
    a = a.wrapping_add(x);
    a = a.wrapping_add(y);
    b = b.wrapping_add(rotate(a, 44));
    (a.wrapping_add(z), b.wrapping_add(c))
}

/// CityHash64 v1.1 of the input bytes
pub fn city64(data: &[u8]) -> u64 {
    let len = data.len();
    if len <= 16 {
        return hash_len_0_to_16(data);
    }
    if len <= 32 {
        return hash_len_17_to_32(data);
    }
    if len <= 64 {
        return hash_len_33_to_64(data);
    }

    let mut s = data;
    let mut x = fetch64(&data[len - 40..]);
    let mut y = fetch64(&data[len - 16..]).wrapping_add(fetch64(&data[len - 56..]));
    let mut z = hash_len_16(
        fetch64(&data[len - 48..]).wrapping_add(len as u64),
        fetch64(&data[len - 24..]),
        K_MUL,
    );
    let mut v = weak_hash_len_32_with_seeds(&data[len - 64..], len as u64, z);
    let mut w = weak_hash_len_32_with_seeds(&data[len - 32..], y.wrapping_add(K1), x);
    x = x.wrapping_mul(K1).wrapping_add(fetch64(data));

    let mut remaining = (len - 1) & !63;
    loop {
        x = rotate(
            x.wrapping_add(y)
                .wrapping_add(v.0)
                .wrapping_add(fetch64(&s[8..])),
            37,
        )
        .wrapping_mul(K1);
        y = rotate(y.wrapping_add(v.1).wrapping_add(fetch64(&s[48..])), 42).wrapping_mul(K1);
        x ^= w.1;
        y = y.wrapping_add(v.0).wrapping_add(fetch64(&s[40..]));
        z = rotate(z.wrapping_add(w.0), 33).wrapping_mul(K1);
        v = weak_hash_len_32_with_seeds(s, v.1.wrapping_mul(K1), x.wrapping_add(w.0));
        w = weak_hash_len_32_with_seeds(
            &s[32..],
            z.wrapping_add(w.1),
            y.wrapping_add(fetch64(&s[16..])),
        );
        std::mem::swap(&mut z, &mut x);
        s = &s[64..];
        remaining -= 64;
        if remaining == 0 {
            break;
        }
    }

    hash_len_16(
        hash_len_16(v.0, w.0, K_MUL)
            .wrapping_add(shift_mix(y).wrapping_mul(K1))
            .wrapping_add(z),
        hash_len_16(v.1, w.1, K_MUL).wrapping_add(x),
        K_MUL,
    )
}

/// Hash an archive-internal path with the container's salt.
///
/// A nonzero salt is decimal-formatted and prepended to the path as text
/// before hashing; salt 0 hashes the path alone.
pub fn hash_key(path: &str, salt: u16) -> u64 {
    if salt == 0 {
        city64(path.as_bytes())
    } else {
        city64(format!("{salt}{path}").as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_k2() {
        assert_eq!(city64(b""), 0x9ae16a3b2f90404f);
    }

    #[test]
    fn all_length_classes_hash() {
        // One input per internal length class; values must be stable and distinct.
        let inputs: [&[u8]; 5] = [
            b"map",
            b"material/ui/map",
            b"material/ui/company/small/road_one",
            b"material/ui/company/small/road_one/and/then/some/more/path/parts",
            &[0x5au8; 200],
        ];
        let hashes: Vec<u64> = inputs.iter().map(|i| city64(i)).collect();
        for (i, h) in hashes.iter().enumerate() {
            assert_eq!(city64(inputs[i]), *h);
            for other in &hashes[i + 1..] {
                assert_ne!(h, other);
            }
        }
    }

    #[test]
    fn salt_is_prepended_as_text() {
        assert_eq!(hash_key("material/ui/map", 0), city64(b"material/ui/map"));
        assert_eq!(hash_key("material/ui/map", 7), city64(b"7material/ui/map"));
        assert_eq!(hash_key("material/ui/map", 1290), city64(b"1290material/ui/map"));
    }
}
