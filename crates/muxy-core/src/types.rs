pub use muxy_schema::{
    Arch, Checksum, DigestAlgorithm, DigestError, DigestHasher, PackageName, ReleaseDescriptor,
    Version,
};
