//! CPU architecture variants of a release.

/// Target architecture of a prebuilt release.
///
/// muxy ships two Intel variants: a 64-bit build and a 32-bit build. The
/// variant is chosen from the host word size; it is never negotiated.
///
/// # Example
///
/// ```
/// use muxy_schema::Arch;
///
/// assert_eq!(Arch::from_word_size(true), Arch::Amd64);
/// assert_eq!(Arch::from_word_size(false).as_str(), "386");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Arch {
    /// 64-bit Intel (`amd64`).
    #[serde(rename = "amd64")]
    Amd64,
    /// 32-bit Intel (`386`).
    #[serde(rename = "386")]
    I386,
}

impl Arch {
    /// Every supported variant, 64-bit first.
    pub const ALL: [Arch; 2] = [Arch::Amd64, Arch::I386];

    /// Map a word-size capability flag to a variant.
    pub fn from_word_size(is_64_bit: bool) -> Self {
        if is_64_bit { Self::Amd64 } else { Self::I386 }
    }

    /// Variant matching the word size this binary was compiled for.
    ///
    /// This reflects the compile target, not the running CPU: a 32-bit build
    /// on a 64-bit host still yields [`Arch::I386`].
    pub fn host_word_size() -> Self {
        Self::from_word_size(cfg!(target_pointer_width = "64"))
    }

    /// Accept the Intel family: `x86` and `x86_64`.
    ///
    /// Callers pass `std::env::consts::ARCH`, which names the compile target.
    /// That is not runtime CPU detection: an `x86_64` build running under
    /// translation on another CPU passes.
    ///
    /// # Errors
    ///
    /// Returns `host` unchanged when it names any other architecture.
    pub fn check_intel(host: &str) -> Result<(), &str> {
        match host {
            "x86" | "x86_64" => Ok(()),
            other => Err(other),
        }
    }

    /// Whether this is the 64-bit variant.
    pub fn is_64_bit(self) -> bool {
        self == Self::Amd64
    }

    /// Short name used in tables and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::I386 => "386",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "amd64" | "x86_64" | "x64" | "64" => Ok(Self::Amd64),
            "386" | "i386" | "i686" | "x86" | "32" => Ok(Self::I386),
            _ => Err(format!("Unknown architecture: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intel_check() {
        assert_eq!(Arch::check_intel("x86_64"), Ok(()));
        assert_eq!(Arch::check_intel("x86"), Ok(()));
        assert_eq!(Arch::check_intel("aarch64"), Err("aarch64"));
        assert_eq!(Arch::check_intel("arm"), Err("arm"));
    }

    #[test]
    fn word_size_mapping_is_total() {
        assert_eq!(Arch::from_word_size(true), Arch::Amd64);
        assert_eq!(Arch::from_word_size(false), Arch::I386);
        assert!(Arch::Amd64.is_64_bit());
        assert!(!Arch::I386.is_64_bit());
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("x86_64".parse::<Arch>().unwrap(), Arch::Amd64);
        assert_eq!("AMD64".parse::<Arch>().unwrap(), Arch::Amd64);
        assert_eq!("i386".parse::<Arch>().unwrap(), Arch::I386);
        assert!("arm64".parse::<Arch>().is_err());
    }

    #[test]
    fn serde_uses_table_keys() {
        let json = serde_json::to_string(&Arch::I386).unwrap();
        assert_eq!(json, "\"386\"");
        let back: Arch = serde_json::from_str("\"amd64\"").unwrap();
        assert_eq!(back, Arch::Amd64);
    }
}
