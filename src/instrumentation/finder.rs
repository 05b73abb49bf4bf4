//!
//! The internal function finder code generator.
//!

use crate::function::Func;
use crate::solc::collector::CompilerCollector;
use crate::types::solidity_type::SolidityType;

use super::error::InstrumentationError;

///
/// The synthesized modifier logging the function call.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierFinder {
    /// The modifier invocation, e.g. `logInternal3(amount)`.
    pub invocation: String,
    /// The modifier definition.
    pub definition: String,
}

///
/// The internal function finder code generator.
///
/// The generated assembly stores the function symbol and the argument values at reserved
/// memory keys, which the verifier recognizes in the bytecode.
///
#[derive(Debug)]
pub struct FinderGenerator {
    /// The internal function ID.
    internal_id: u64,
    /// The local declarations renaming the arguments named after opcodes.
    renamings: Vec<String>,
}

impl FinderGenerator {
    /// The Yul builtins which cannot be used as identifiers in inline assembly.
    pub const OPCODES: [&'static str; 76] = [
        "stop",
        "add",
        "sub",
        "mul",
        "div",
        "sdiv",
        "mod",
        "smod",
        "exp",
        "not",
        "lt",
        "gt",
        "slt",
        "sgt",
        "eq",
        "iszero",
        "and",
        "or",
        "xor",
        "byte",
        "shl",
        "shr",
        "sar",
        "addmod",
        "mulmod",
        "signextend",
        "keccak256",
        "pc",
        "pop",
        "mload",
        "mstore",
        "mstore8",
        "sload",
        "sstore",
        "msize",
        "gas",
        "address",
        "balance",
        "selfbalance",
        "caller",
        "callvalue",
        "calldataload",
        "calldatasize",
        "calldatacopy",
        "codesize",
        "codecopy",
        "extcodesize",
        "extcodecopy",
        "returndatasize",
        "returndatacopy",
        "extcodehash",
        "create",
        "create2",
        "call",
        "callcode",
        "delegatecall",
        "staticcall",
        "return",
        "revert",
        "selfdestruct",
        "invalid",
        "log0",
        "log1",
        "log2",
        "log3",
        "log4",
        "chainid",
        "basefee",
        "origin",
        "gasprice",
        "blockhash",
        "coinbase",
        "timestamp",
        "number",
        "difficulty",
        "gaslimit",
    ];

    /// The finder symbol base.
    pub const SYMBOL_BASE: u64 = 0xf196e50000;

    /// The key flag of a plain argument.
    const FLAG_ARGUMENT: u64 = 0x1000;

    /// The key flag of a decomposed calldata argument length.
    const FLAG_LENGTH: u64 = 0x2000;

    /// The key flag of a decomposed calldata argument offset.
    const FLAG_OFFSET: u64 = 0x3000;

    /// The key flag of a decomposed argument which cannot be accessed in assembly.
    const FLAG_PLACEHOLDER: u64 = 0x4000;

    /// The key flag of an unnamed argument.
    const FLAG_UNNAMED: u64 = 0x5000;

    /// The key flag of the argument logged by a modifier.
    const FLAG_MODIFIER_ARGUMENT: u64 = 0x6000;

    /// The key flag of the decomposed argument offset logged by a modifier.
    const FLAG_MODIFIER_OFFSET: u64 = 0x6100;

    ///
    /// A shortcut constructor.
    ///
    pub fn new(internal_id: u64) -> Self {
        Self {
            internal_id,
            renamings: Vec::new(),
        }
    }

    ///
    /// Returns the finder symbol of the internal function ID.
    ///
    pub fn symbol(internal_id: u64) -> u64 {
        Self::SYMBOL_BASE + internal_id
    }

    ///
    /// Returns the memory key with the flag.
    ///
    pub fn key(&self, flag: u64) -> String {
        format!(
            "0xffffff6e4604afefe123321beef1b01fffffffffffffffffffffffff{:04x}{:04x}",
            self.internal_id, flag
        )
    }

    ///
    /// Whether the name is reserved in inline assembly.
    ///
    pub fn is_opcode(name: &str) -> bool {
        Self::OPCODES.contains(&name)
    }

    ///
    /// Returns the name to use for the argument in inline assembly.
    ///
    /// Arguments named after opcodes are copied to a renamed local variable first.
    ///
    pub fn normalize_argument(
        &mut self,
        index: usize,
        r#type: &SolidityType,
        name: &str,
    ) -> Result<String, InstrumentationError> {
        if !Self::is_opcode(name) {
            return Ok(name.to_owned());
        }
        let renamed = format!("certoraRename{}_{}", self.internal_id, index);
        let declaration =
            r#type
                .declaration
                .as_deref()
                .ok_or_else(|| InstrumentationError::Renaming {
                    name: name.to_owned(),
                    type_name: r#type.source_code_signature(),
                })?;
        self.renamings
            .push(format!("{} {} = {};", declaration, renamed, name));
        Ok(renamed)
    }

    ///
    /// The renaming declarations.
    ///
    pub fn renaming(&self) -> String {
        self.renamings.join(" ")
    }

    ///
    /// Generates the inline assembly block logging the call, inserted at the body start.
    ///
    pub fn full_assembly_finder(
        function: &Func,
        internal_id: u64,
        collector: &CompilerCollector,
    ) -> Result<String, InstrumentationError> {
        let mut generator = Self::new(internal_id);
        let symbol_count = Self::symbol_count(function.full_args.as_slice());

        let mut finder = format!(
            "assembly {{ mstore({}, {}) mstore({}, {}) ",
            generator.key(0),
            Self::symbol(internal_id),
            generator.key(1),
            symbol_count
        );
        for (index, r#type) in function.full_args.iter().enumerate() {
            let name = generator.normalize_argument(
                index,
                r#type,
                function.param_names[index].as_str(),
            )?;
            let index = index as u64;

            if r#type.is_decomposed() {
                if collector.supports_calldata_assembly(name.as_str()) {
                    finder.push_str(
                        format!(
                            "mstore({}, {}.offset) mstore({}, {}.length) ",
                            generator.key(Self::FLAG_OFFSET + index),
                            name,
                            generator.key(Self::FLAG_LENGTH + index),
                            name
                        )
                        .as_str(),
                    );
                } else {
                    finder.push_str(
                        format!("mstore({}, 0) ", generator.key(Self::FLAG_PLACEHOLDER + index))
                            .as_str(),
                    );
                }
                continue;
            }
            if name.is_empty() {
                finder.push_str(
                    format!("mstore({}, 0) ", generator.key(Self::FLAG_UNNAMED + index)).as_str(),
                );
                continue;
            }
            finder.push_str(
                format!(
                    "mstore({}, {}) ",
                    generator.key(Self::FLAG_ARGUMENT + index),
                    collector.normalize_storage(r#type.is_storage, name.as_str())
                )
                .as_str(),
            );
        }
        finder.push('}');

        Ok(generator.renaming() + finder.as_str())
    }

    ///
    /// Generates the modifier logging the call, for functions which already have modifiers.
    ///
    /// The modifier takes the last argument which can be logged, if any.
    ///
    pub fn modifier_finder(
        function: &Func,
        internal_id: u64,
        collector: &CompilerCollector,
    ) -> Result<ModifierFinder, InstrumentationError> {
        let mut generator = Self::new(internal_id);
        let name = format!("logInternal{}", internal_id);
        let arguments = function.full_args.as_slice();
        let symbol_count = Self::symbol_count(arguments);

        let last_loggable = arguments
            .iter()
            .zip(function.param_names.iter())
            .enumerate()
            .filter(|(_, (r#type, name))| {
                !name.is_empty()
                    && (!r#type.is_decomposed() || collector.supports_calldata_assembly(name))
            })
            .map(|(index, _)| index)
            .last();

        let mut type_layout = num::BigUint::from(0u8);
        for r#type in arguments.iter() {
            type_layout = if r#type.is_decomposed() {
                (type_layout << 4usize) | num::BigUint::from(0b1110u8)
            } else {
                (type_layout << 2usize) | num::BigUint::from(0b1u8)
            };
        }

        let prefix = format!(
            "assembly {{ mstore({}, {}) mstore({}, {}) ",
            generator.key(0),
            Self::symbol(internal_id),
            generator.key(1),
            symbol_count
        );
        let suffix = "} _; }";

        let index = match last_loggable {
            Some(index) => index,
            None => {
                return Ok(ModifierFinder {
                    invocation: format!("{}()", name),
                    definition: format!(
                        "modifier {}() {{{}mstore({}, {}) {}",
                        name,
                        prefix,
                        generator.key(2),
                        type_layout,
                        suffix
                    ),
                });
            }
        };

        let logged_type = &arguments[index];
        let logged_name = function.param_names[index].as_str();
        let declaration = logged_type
            .declaration
            .as_deref()
            .unwrap_or(logged_type.base_type.as_str());
        let mut definition = format!("modifier {}({} {}) {{ ", name, declaration, logged_name);

        let renamed = generator
            .normalize_argument(index, logged_type, logged_name)
            .map_err(|error| {
                tracing::debug!(target: "finder_instrumentation", "failed to alpha rename argument {}: {}", index, error);
                error
            })?;
        definition.push_str(generator.renaming().as_str());
        definition.push_str(prefix.as_str());
        definition.push_str(format!("mstore({}, {}) ", generator.key(3), type_layout).as_str());

        let symbol_offset = Self::symbol_count(&arguments[..index]);
        let (flag, value) = if logged_type.is_decomposed() {
            (
                Self::FLAG_MODIFIER_OFFSET + symbol_offset,
                format!("{}.offset", renamed),
            )
        } else {
            (
                Self::FLAG_MODIFIER_ARGUMENT + symbol_offset,
                collector.normalize_storage(logged_type.is_storage, renamed.as_str()),
            )
        };
        definition.push_str(format!("mstore({}, {}) ", generator.key(flag), value).as_str());
        definition.push_str(suffix);

        Ok(ModifierFinder {
            invocation: format!("{}({})", name, logged_name),
            definition,
        })
    }

    ///
    /// The number of logged symbols: one per argument, two per decomposed one.
    ///
    fn symbol_count(arguments: &[SolidityType]) -> u64 {
        arguments
            .iter()
            .map(|r#type| if r#type.is_decomposed() { 2 } else { 1 })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler_lang::CompilerLang;
    use crate::function::tests::func;
    use crate::function::visibility::Visibility;
    use crate::solc::collector::CompilerCollector;

    use super::FinderGenerator;

    fn collector() -> CompilerCollector {
        CompilerCollector::new(
            CompilerLang::Solidity,
            "solc".to_owned(),
            semver::Version::new(0, 8, 17),
            String::new(),
        )
    }

    #[test]
    fn opcode_table() {
        assert_eq!(FinderGenerator::OPCODES.len(), 76);
        assert!(FinderGenerator::is_opcode("balance"));
        assert!(!FinderGenerator::is_opcode("amount"));
    }

    #[test]
    fn full_assembly_finder_logs_arguments() {
        let function = func("f", &["uint256"], Visibility::Internal);
        let finder = FinderGenerator::full_assembly_finder(&function, 1, &collector())
            .expect("Always valid");
        assert_eq!(
            finder,
            "assembly { \
            mstore(0xffffff6e4604afefe123321beef1b01fffffffffffffffffffffffff00010000, 1037618708481) \
            mstore(0xffffff6e4604afefe123321beef1b01fffffffffffffffffffffffff00010001, 1) \
            mstore(0xffffff6e4604afefe123321beef1b01fffffffffffffffffffffffff00011000, a0) }"
        );
    }

    #[test]
    fn full_assembly_finder_renames_opcode_arguments() {
        let mut function = func("f", &["uint256", "bytes"], Visibility::Internal);
        function.param_names = vec!["balance".to_owned(), "data".to_owned()];
        function.full_args[1].is_calldata = true;
        function.full_args[1].declaration = Some("bytes calldata".to_owned());
        let finder = FinderGenerator::full_assembly_finder(&function, 7, &collector())
            .expect("Always valid");

        assert!(finder.starts_with("uint256 certoraRename7_0 = balance;assembly { "));
        assert!(finder.contains("00071000, certoraRename7_0)"));
        assert!(finder.contains("00073001, data.offset)"));
        assert!(finder.contains("00072001, data.length)"));
        assert!(finder.contains("00070001, 3)"));
    }

    #[test]
    fn renaming_without_declaration_fails() {
        let mut function = func("f", &["uint256"], Visibility::Internal);
        function.param_names = vec!["gas".to_owned()];
        function.full_args[0].declaration = None;
        assert!(FinderGenerator::full_assembly_finder(&function, 1, &collector()).is_err());
    }

    #[test]
    fn modifier_finder_without_arguments() {
        let function = func("f", &[], Visibility::Internal);
        let finder =
            FinderGenerator::modifier_finder(&function, 2, &collector()).expect("Always valid");
        assert_eq!(finder.invocation, "logInternal2()");
        assert_eq!(
            finder.definition,
            "modifier logInternal2() {assembly { \
            mstore(0xffffff6e4604afefe123321beef1b01fffffffffffffffffffffffff00020000, 1037618708482) \
            mstore(0xffffff6e4604afefe123321beef1b01fffffffffffffffffffffffff00020001, 0) \
            mstore(0xffffff6e4604afefe123321beef1b01fffffffffffffffffffffffff00020002, 0) } _; }"
        );
    }

    #[test]
    fn modifier_finder_logs_last_named_argument() {
        let mut function = func("f", &["uint256", "address", "uint256"], Visibility::Internal);
        function.param_names[2] = String::new();
        let finder =
            FinderGenerator::modifier_finder(&function, 3, &collector()).expect("Always valid");
        assert_eq!(finder.invocation, "logInternal3(a1)");
        assert!(finder.definition.starts_with("modifier logInternal3(address a1) { assembly { "));
        assert!(finder.definition.contains("00030003, 21)"));
        assert!(finder.definition.contains("00036001, a1)"));
        assert!(finder.definition.ends_with("} _; }"));
    }
}
