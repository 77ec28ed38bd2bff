//! Lexer integration tests over realistic program shapes.

use acorn_common::token::TokenKind;
use acorn_lexer::Lexer;

fn kinds(source: &str) -> Vec<TokenKind> {
    let (tokens, errors) = Lexer::tokenize("test.acorn", source);
    assert!(errors.is_empty(), "unexpected lex errors: {errors:?}");
    tokens.into_iter().map(|t| t.kind).collect()
}

fn balance(source: &str) {
    let kinds = kinds(source);
    let indents = kinds.iter().filter(|k| **k == TokenKind::Indent).count();
    let deindents = kinds.iter().filter(|k| **k == TokenKind::Deindent).count();
    assert_eq!(
        indents, deindents,
        "indentation must balance for:\n{source}"
    );
    assert_eq!(kinds.last(), Some(&TokenKind::EndOfFile));
}

#[test]
fn whole_program_token_stream() {
    let source = "\
def add(a as Integer64, b as Integer64) as Integer64
    a + b
end
let total = add(2, 3)
";
    let kinds = kinds(source);
    // def, add, (, a, as, Integer64, ...
    assert_eq!(kinds[0], TokenKind::Keyword);
    assert_eq!(kinds[1], TokenKind::Name);
    assert_eq!(kinds[2], TokenKind::OpenParenthesis);
    assert!(kinds.contains(&TokenKind::Indent));
    assert!(kinds.contains(&TokenKind::Deindent));
    assert_eq!(kinds.last(), Some(&TokenKind::EndOfFile));
}

#[test]
fn indentation_balances_across_program_shapes() {
    balance("");
    balance("let x = 1\n");
    balance("def f()\n    1\nend\n");
    balance("def f()\n    if a\n        1\n    else\n        2\n    end\nend\n");
    balance("while a\n    while b\n        x\n    end\nend\n");
    balance("type Point\n    x as Integer64\nend\n");
    balance("module M\n    def f()\n        1\n    end\nend\n");
    balance("def f()\n    x\nend"); // no trailing newline
}

#[test]
fn generics_braces_lex_as_braces() {
    let kinds = kinds("def id{T}(x as T) as T\n    x\nend\n");
    assert!(kinds.contains(&TokenKind::OpenBrace));
    assert!(kinds.contains(&TokenKind::CloseBrace));
}

#[test]
fn keyword_arguments_use_colon() {
    let kinds = kinds("f(a: 1)\n");
    assert_eq!(
        kinds,
        vec![
            TokenKind::Name,
            TokenKind::OpenParenthesis,
            TokenKind::Name,
            TokenKind::Colon,
            TokenKind::IntLiteral,
            TokenKind::CloseParenthesis,
            TokenKind::EndOfFile,
        ]
    );
}

#[test]
fn every_token_has_a_location_on_its_line() {
    let source = "let a = 1\nlet b = 2\nlet c = 3\n";
    let (tokens, _) = Lexer::tokenize("test.acorn", source);
    for token in &tokens {
        if token.kind == TokenKind::EndOfFile {
            continue;
        }
        assert!(token.location.line_number >= 1);
        assert!(token.location.column >= 1);
        if token.kind != TokenKind::Newline
            && token.kind != TokenKind::Indent
            && token.kind != TokenKind::Deindent
            && !token.lexeme.is_empty()
        {
            assert!(
                token.location.line_text.contains(&token.lexeme),
                "token {:?} not on its line {:?}",
                token.lexeme,
                token.location.line_text
            );
        }
    }
}

#[test]
fn deindent_tokens_come_before_end_keyword() {
    let (tokens, _) = Lexer::tokenize("t", "while a\n    x\nend\n");
    let deindent_pos = tokens
        .iter()
        .position(|t| t.kind == TokenKind::Deindent)
        .expect("deindent present");
    let end_pos = tokens
        .iter()
        .position(|t| t.kind == TokenKind::Keyword && t.lexeme == "end")
        .expect("end present");
    assert!(deindent_pos < end_pos);
}

#[test]
fn strings_may_contain_operators_and_keywords() {
    let (tokens, errors) = Lexer::tokenize("t", "\"let x = 1 + 2 # not a comment\"");
    assert!(errors.is_empty());
    assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
    assert_eq!(tokens[0].lexeme, "let x = 1 + 2 # not a comment");
    assert_eq!(tokens[1].kind, TokenKind::EndOfFile);
}

#[test]
fn unterminated_string_is_reported() {
    let (_, errors) = Lexer::tokenize("t", "\"oops");
    assert_eq!(errors.len(), 1);
}
