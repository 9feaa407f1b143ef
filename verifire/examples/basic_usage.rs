//! Basic usage example for `Verifire`.

use std::path::PathBuf;
use verifire::prelude::*;
use verifire_key_file::FileKeyStore;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifire Basic Usage Example");
    println!("============================\n");

    // Setup: load or create the key file
    let store = FileKeyStore::new(PathBuf::from("./example_secret.key"));
    let (key, origin) = store.ensure_key_with_origin()?;
    println!("✓ Key {origin:?} (fingerprint {})\n", key.fingerprint());

    // Seal a single field
    let vault = Vault::new(&key);
    let token = vault.encrypt_value("A1234567")?;
    println!("Token: {}... ({} chars)", token.preview(40), token.len());

    let id_number: String = vault.decrypt_value(&token)?;
    assert_eq!(id_number, "A1234567");
    println!("✓ Decrypted: {id_number}\n");

    // Assemble a full record for the document store
    let record = PlainRecord {
        email: "saumy@example.com".to_string(),
        name: FullName { first: "Saumy".into(), middle: None, last: "Kakkad".into() },
        age: 21,
        id_number,
    };
    let assembler = RecordAssembler::new(vault);
    let stored = assembler.assemble(&record, SealMode::IdNumber)?;
    println!("Stored document:\n{}", serde_json::to_string_pretty(&stored.to_document()?)?);

    assert_eq!(assembler.open(&stored)?, record);
    println!("✓ Record round-trip verified\n");

    // A different key cannot open the token
    let other = Key::generate();
    match Vault::new(&other).decrypt(&token) {
        Err(e) => println!("✓ Wrong key rejected: {e}"),
        Ok(_) => unreachable!("a different key must not open the token"),
    }

    println!("\nNote: {} can be deleted manually", store.path().display());
    Ok(())
}
