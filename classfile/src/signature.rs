//! Descriptors and generic signatures.
//!
//! Both share one grammar, recognized here by a single forward pass with no
//! backtracking:
//!
//! ```txt
//! signature   := <type_params>? ( "(" <type>* ")" )? <type>* ( "^" <type> )* ;
//! type_params := "<" ( <ident> ( ":" <type>? )* )* ">" ;
//! type        := "B" | "C" | "D" | "F" | "I" | "J" | "S" | "V" | "Z"
//!              | "+" <type> | "-" <type> | "*"
//!              | <class_type>
//!              | "T" <ident> ";"
//!              | "[" <type>
//!              ;
//! class_type  := "L" <binary> <type_args>? ( "." <binary> <type_args>? )* ";" ;
//! type_args   := "<" <type>* ">" ;
//! binary      := <ident> ( "/" <ident> )* ;
//! ident       := any run of characters except ";" "." "/" "[" ":" "<" ">" ;
//! ```
//!
//! The grammar is deliberately loose: it accepts field descriptors, method
//! descriptors, and class, method and field signatures without being told
//! which one it is looking at. Wildcards are accepted anywhere a type is.
//! The one thing it insists on is that the whole input is consumed.
//!
//! Array types may have at most 255 dimensions, and type arguments may nest
//! at most 255 deep.

use std::ops::Range;
use thiserror::Error;

const MAX_ARRAY_DIMENSIONS: usize = 255;
const MAX_TYPE_ARGUMENT_DEPTH: usize = 255;

#[derive(Clone, Debug, Eq, PartialEq, Hash, Error)]
#[error("{message} at offset {offset} in `{signature}`")]
pub struct SignatureError {
    pub signature: String,
    pub offset: usize,
    pub message: &'static str,
}

struct SignatureParser<'a, F> {
    src: &'a str,
    index: usize,
    depth: usize,
    on_binary: F,
}

impl<'a, F> SignatureParser<'a, F>
where
    F: FnMut(Range<usize>, &'a str),
{
    fn new(src: &'a str, on_binary: F) -> Self {
        SignatureParser {
            src,
            index: 0,
            depth: 0,
            on_binary,
        }
    }

    fn error(&self, message: &'static str) -> SignatureError {
        SignatureError {
            signature: self.src.to_owned(),
            offset: self.index,
            message,
        }
    }

    fn current(&self) -> Option<u8> {
        self.src.as_bytes().get(self.index).copied()
    }

    fn next(&mut self) {
        self.index += 1;
    }

    /// Advances past `ch` if it is the current character.
    fn expect(&mut self, ch: u8) -> bool {
        if self.current() == Some(ch) {
            self.next();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, ch: u8, message: &'static str) -> Result<(), SignatureError> {
        if self.expect(ch) {
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn is_type(&self) -> bool {
        match self.current() {
            Some(b'B') | Some(b'C') | Some(b'D') | Some(b'F') | Some(b'I') | Some(b'J')
            | Some(b'S') | Some(b'V') | Some(b'Z') => true,
            Some(b'L') | Some(b'T') | Some(b'[') => true,
            Some(b'+') | Some(b'-') | Some(b'*') => true,
            _ => false,
        }
    }

    fn is_identifier(&self) -> bool {
        match self.current() {
            None => false,
            Some(b';') | Some(b'.') | Some(b'/') | Some(b'[') | Some(b':') | Some(b'<')
            | Some(b'>') => false,
            Some(_) => true,
        }
    }

    fn parse(mut self) -> Result<(), SignatureError> {
        if self.expect(b'<') {
            self.type_params()?;
            self.consume(b'>', "expected `>` to close type parameters")?;
        }

        if self.expect(b'(') {
            while self.is_type() {
                self.type_()?;
            }
            self.consume(b')', "expected `)` to close parameter list")?;
        }

        while self.is_type() {
            self.type_()?;
        }

        while self.expect(b'^') {
            self.type_()?;
        }

        match self.current() {
            None => Ok(()),
            Some(_) => Err(self.error("unexpected trailing characters")),
        }
    }

    // T:Ljava/lang/Object;U::Ljava/lang/Runnable;
    fn type_params(&mut self) -> Result<(), SignatureError> {
        while self.is_identifier() {
            self.identifier();
            while self.expect(b':') {
                if self.is_type() {
                    self.type_()?;
                }
            }
        }
        Ok(())
    }

    fn type_(&mut self) -> Result<(), SignatureError> {
        let mut dimensions = 0;
        loop {
            match self.current() {
                Some(b'[') => {
                    dimensions += 1;
                    if dimensions > MAX_ARRAY_DIMENSIONS {
                        return Err(self.error("array type has more than 255 dimensions"));
                    }
                }
                Some(b'+') | Some(b'-') => {}
                _ => break,
            }
            self.next();
        }

        match self.current() {
            Some(b'B') | Some(b'C') | Some(b'D') | Some(b'F') | Some(b'I') | Some(b'J')
            | Some(b'S') | Some(b'V') | Some(b'Z') | Some(b'*') => {
                self.next();
                Ok(())
            }
            Some(b'L') => self.class_type(),
            Some(b'T') => self.variable(),
            _ => Err(self.error("expected a type")),
        }
    }

    // Ljava/util/Map<TK;TV;>.Entry<TK;TV;>;
    fn class_type(&mut self) -> Result<(), SignatureError> {
        self.consume(b'L', "expected `L`")?;
        loop {
            self.binary();
            if self.expect(b'<') {
                self.depth += 1;
                if self.depth > MAX_TYPE_ARGUMENT_DEPTH {
                    return Err(self.error("type arguments nested more than 255 deep"));
                }
                while self.is_type() {
                    self.type_()?;
                }
                self.consume(b'>', "expected `>` to close type arguments")?;
                self.depth -= 1;
            }

            if !self.expect(b'.') {
                break;
            }
        }
        self.consume(b';', "expected `;` to end class type")
    }

    fn variable(&mut self) -> Result<(), SignatureError> {
        self.consume(b'T', "expected `T`")?;
        self.identifier();
        self.consume(b';', "expected `;` to end type variable")
    }

    fn binary(&mut self) {
        let start = self.index;
        loop {
            self.identifier();
            if !self.expect(b'/') {
                break;
            }
        }

        // Every excluded character is ASCII, so both ends sit on char boundaries.
        let range = start..self.index;
        if !range.is_empty() {
            let src = self.src;
            (self.on_binary)(range.clone(), &src[range]);
        }
    }

    fn identifier(&mut self) {
        while self.is_identifier() {
            self.next();
        }
    }
}

/// Checks that `signature` is a well formed descriptor or signature.
pub fn parse(signature: &str) -> Result<(), SignatureError> {
    SignatureParser::new(signature, |_, _| {}).parse()
}

/// Every binary name mentioned by `signature`, in order of appearance.
///
/// The simple names of inner classes (`Inner` in `La/Outer<TT;>.Inner;`) are
/// reported on their own, since the grammar cannot tell them apart from a
/// top-level name.
pub fn binary_names(signature: &str) -> Result<Vec<&str>, SignatureError> {
    let mut names = Vec::new();
    SignatureParser::new(signature, |_, name| names.push(name)).parse()?;
    Ok(names)
}

/// Rewrites every binary name in `signature` for which `mapper` answers with a
/// different name.
///
/// Returns `Ok(None)` if nothing was replaced.
pub fn rename<F>(signature: &str, mut mapper: F) -> Result<Option<String>, SignatureError>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    SignatureParser::new(signature, |range, name| match mapper(name) {
        Some(to) if to != name => edits.push((range, to)),
        _ => {}
    })
    .parse()?;

    if edits.is_empty() {
        return Ok(None);
    }

    // The parser never revisits text, so the edits are ordered and disjoint.
    let mut out = String::with_capacity(signature.len());
    let mut last = 0;
    for (range, to) in &edits {
        out.push_str(&signature[last..range.start]);
        out.push_str(to);
        last = range.end;
    }
    out.push_str(&signature[last..]);
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc_to_xyz(name: &str) -> Option<String> {
        match name {
            "a/b/C" => Some("x/y/Z".to_owned()),
            _ => None,
        }
    }

    #[test]
    fn test_rename_descriptor() {
        assert_eq!(
            rename("(La/b/C;)V", abc_to_xyz).unwrap().as_deref(),
            Some("(Lx/y/Z;)V")
        );
    }

    #[test]
    fn test_rename_leaves_other_names() {
        assert_eq!(
            rename("(Ljava/lang/String;La/b/C;[La/b/C;)La/b/Cx;", abc_to_xyz)
                .unwrap()
                .as_deref(),
            Some("(Ljava/lang/String;Lx/y/Z;[Lx/y/Z;)La/b/Cx;")
        );
        assert_eq!(rename("(Ljava/lang/String;)V", abc_to_xyz), Ok(None));
    }

    #[test]
    fn test_rename_identity_is_no_change() {
        assert_eq!(rename("La/b/C;", |name| Some(name.to_owned())), Ok(None));
    }

    #[test]
    fn test_rename_generic_signature() {
        let sig = "<T:La/b/C;>Ljava/lang/Object;Ljava/util/List<+La/b/C;>;";
        assert_eq!(
            rename(sig, abc_to_xyz).unwrap().as_deref(),
            Some("<T:Lx/y/Z;>Ljava/lang/Object;Ljava/util/List<+Lx/y/Z;>;")
        );
    }

    #[test]
    fn test_binary_names_in_order() {
        let sig = "<K::Ljava/lang/Comparable<TK;>;>(Ljava/util/Map<TK;*>.Entry;[[I)TK;^La/Ex;";
        assert_eq!(
            binary_names(sig).unwrap(),
            vec!["java/lang/Comparable", "java/util/Map", "Entry", "a/Ex"]
        );
    }

    #[test]
    fn test_accepts_descriptors_and_signatures() {
        for sig in &[
            "",
            "I",
            "[[J",
            "Ljava/lang/Object;",
            "()V",
            "(IDLjava/lang/Thread;)Ljava/lang/Object;",
            "<T:Ljava/lang/Object;>(TT;)TT;",
            "<E:Ljava/lang/Exception;>()V^TE;^Ljava/io/IOException;",
            "Ljava/util/List<*>;",
            "Ljava/util/Map<-Ljava/lang/Integer;+[TV;>;",
            "La/Outer<Ljava/lang/String;>.Inner<TT;>;",
            "Lcom/ex/Ünïcode;",
        ] {
            assert_eq!(parse(sig), Ok(()), "{}", sig);
        }
    }

    #[test]
    fn test_rejects_trailing_characters() {
        let err = parse("(I)VX").unwrap_err();
        assert_eq!(err.offset, 4);
        assert_eq!(err.message, "unexpected trailing characters");
        assert!(parse("Ljava/lang/Object;;").is_err());
    }

    #[test]
    fn test_deep_arrays_are_an_error() {
        let deep = "[".repeat(60000) + "I";
        let err = parse(&deep).unwrap_err();
        assert_eq!(err.offset, 255);
        assert_eq!(err.message, "array type has more than 255 dimensions");
        assert!(rename(&deep, abc_to_xyz).is_err());

        assert_eq!(parse(&("[".repeat(255) + "La/b/C;")), Ok(()));
        assert_eq!(parse(&("+-".repeat(30000) + "I")), Ok(()));
    }

    #[test]
    fn test_deep_type_arguments_are_an_error() {
        let nested = |depth: usize| "La<".repeat(depth) + "I" + &">;".repeat(depth);

        assert_eq!(parse(&nested(255)), Ok(()));
        let err = parse(&nested(256)).unwrap_err();
        assert_eq!(err.message, "type arguments nested more than 255 deep");
        assert!(parse(&nested(20000)).is_err());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(parse("(I").is_err());
        assert!(parse("Ljava/lang/Object").is_err());
        assert!(parse("[").is_err());
        assert!(parse("<T:Ljava/lang/Object;").is_err());
        assert!(parse("TT").is_err());
        assert!(rename("(La/b/C;", abc_to_xyz).is_err());
    }
}
