mod alias;

pub use alias::AliasRegistry;
