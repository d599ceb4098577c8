extern crate proc_macro as pm;

use quote::quote;

use syn::{Generics, Ident, Type, WhereClause, Token, braced, parse_macro_input};
use syn::token;

#[derive(Debug)]
struct ImplPayloadInput {
	pub generics: Generics,
	pub trait_name: Ident,
	pub types: Vec<Type>
}

fn parse_types(input: syn::parse::ParseStream) -> syn::Result<Vec<Type>> {
	// If implementing a single type
	if !input.peek(token::Brace) {
		let ty = input.parse::<Type>()?;
		return Ok(vec![ty]);
	}

	// Otherwise, parse all of them separated by a comma
	let content;
	braced!(content in input);

	let mut types = vec![];

	while !content.is_empty() {
		let ty = content.parse::<Type>()?;
		types.push(ty);

		// Parse the comma if it exists
		if content.peek(Token![,]) {
			let _comma = content.parse::<Token![,]>()?;
		}
	}

	Ok(types)
}

impl syn::parse::Parse for ImplPayloadInput {
	fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
		// Optional leading `<...>`, empty when absent
		let mut generics = input.parse::<Generics>()?;

		let trait_name = input.parse::<Ident>()?;
		let _for_token = input.parse::<Token![for]>()?;
		let types = parse_types(input)?;

		if input.peek(Token![where]) {
			generics.where_clause = Some(input.parse::<WhereClause>()?);
		}

		Ok(Self {
			generics,
			trait_name,
			types
		})
	}
}

/// Implements a zero-initialisable payload trait for every listed type.
///
/// Accepted forms:
///
/// ```text
/// impl_payload!(Payload for u64);
/// impl_payload!(Payload for {u8, u16, u32});
/// impl_payload!(<const N: usize> Payload for [u8; N]);
/// impl_payload!(<T> Payload for Wrapper<T> where T: Payload);
/// ```
///
/// The trait must declare `fn zeroed() -> Self` and be `unsafe`: the generated
/// body is `core::mem::zeroed()`, so only list types for which the all-zero
/// bit pattern is a valid value.
#[proc_macro]
pub fn impl_payload(input: pm::TokenStream) -> pm::TokenStream {
	let ImplPayloadInput {
		generics,
		trait_name,
		types
	} = parse_macro_input!(input as ImplPayloadInput);

	let (impl_generics, _, where_clause) = generics.split_for_impl();

	let mut impls = vec![];

	for ty in types {
		impls.push(quote! {
			unsafe impl #impl_generics #trait_name for #ty #where_clause {
				#[inline]
				fn zeroed() -> Self {
					unsafe { ::core::mem::zeroed() }
				}
			}
		});
	}

	quote! {
		#( #impls )*
	}.into()
}
