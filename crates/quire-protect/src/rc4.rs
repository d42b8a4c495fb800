// SPDX-License-Identifier: MIT
//
// RC4 stream cipher, as the legacy revision 3 handler requires. Weak by
// modern standards; kept only for compatibility with readers that predate
// AES support.

struct Rc4 {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    // Key length is 5 to 16 bytes for PDF use.
    fn new(key: &[u8]) -> Self {
        let mut s = [0u8; 256];
        for (i, value) in s.iter_mut().enumerate() {
            *value = i as u8;
        }
        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(s[i]).wrapping_add(key[i % key.len()]);
            s.swap(i, j as usize);
        }
        Self { s, i: 0, j: 0 }
    }

    fn next_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.s[self.i as usize]);
        self.s.swap(self.i as usize, self.j as usize);
        let k = self.s[self.i as usize].wrapping_add(self.s[self.j as usize]);
        self.s[k as usize]
    }
}

/// Apply the RC4 keystream to `data`. Encryption and decryption are the
/// same XOR operation.
pub fn rc4_crypt(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut cipher = Rc4::new(key);
    data.iter().map(|byte| byte ^ cipher.next_byte()).collect()
}
